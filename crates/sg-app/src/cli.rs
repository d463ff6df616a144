use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sg_core::config::GateConfig;

/// sonogate — Enregistrement capteur protégé par badge RFID, avec comparaison à une référence.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Port série de la carte (ex: /dev/ttyACM0, COM7).
    #[arg(long)]
    pub port: Option<String>,

    /// Durée d'enregistrement en secondes.
    #[arg(long)]
    pub duration: Option<u32>,

    /// UID de badge attendu.
    #[arg(long)]
    pub credential: Option<String>,

    /// Graine du tirage des fenêtres (rend la comparaison reproductible).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Répertoire des séries enregistrées.
    #[arg(long)]
    pub store_dir: Option<PathBuf>,

    /// Écrire un rapport JSON de la session.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Afficher le compte à rebours dans une barre de progression.
    #[arg(long, default_value_t = false)]
    pub tui: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare deux séries déjà enregistrées, sans matériel.
    Compare {
        /// Nom de la série courante.
        recording: String,
        /// Nom de la série de référence.
        reference: String,
    },
}

impl Cli {
    /// Applique les overrides CLI sur la configuration chargée.
    ///
    /// # Errors
    /// Returns an error if the resulting configuration is invalid.
    pub fn apply_overrides(&self, config: &mut GateConfig) -> anyhow::Result<()> {
        if let Some(ref port) = self.port {
            config.port.clone_from(port);
        }
        if let Some(duration) = self.duration {
            config.duration_seconds = duration;
        }
        if let Some(ref credential) = self.credential {
            config.expected_credential.clone_from(credential);
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(ref dir) = self.store_dir {
            config.store_dir.clone_from(dir);
        }
        if let Some(Command::Compare {
            recording,
            reference,
        }) = &self.command
        {
            config.recording_name.clone_from(recording);
            config.reference_name.clone_from(reference);
        }
        config.clamp_all();
        config.validate()?;
        Ok(())
    }
}
