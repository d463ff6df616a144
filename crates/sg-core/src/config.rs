use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration complète d'une session.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine,
/// reprise du montage d'origine (Arduino sur port série, 30 s à 10 Hz).
///
/// # Example
/// ```
/// use sg_core::config::GateConfig;
/// let config = GateConfig::default();
/// assert_eq!(config.capacity(), 300);
/// assert_eq!(config.window_size(), 50);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GateConfig {
    // === Enregistrement ===
    /// Durée de l'enregistrement en secondes.
    pub duration_seconds: u32,
    /// Lectures attendues par seconde. Fixe la capacité du buffer.
    pub sampling_rate_hz: u32,
    /// Période de scrutation du capteur, en millisecondes.
    pub tick_ms: u64,

    // === Comparaison ===
    /// Taille de fenêtre en échantillons. `None` = 5 secondes de signal.
    pub window_size_samples: Option<usize>,
    /// Écart absolu maximal pour un point commun.
    pub tolerance: f64,
    /// Bande de bruit exclue du comptage `[low, high]`, bornes incluses.
    pub exclusion_band: [f64; 2],
    /// Nombre de fenêtres aléatoires tentées.
    pub trials: u32,
    /// Points communs requis dans une fenêtre.
    pub min_common_points: usize,
    /// Graine du tirage des fenêtres. `None` = aléatoire.
    pub seed: Option<u64>,

    // === Badge ===
    /// UID attendu, tel que le lecteur l'envoie ("69 DC FC D5").
    pub expected_credential: String,
    /// Attente maximale d'un badge en secondes. 0 = illimitée.
    pub credential_timeout_secs: u64,

    // === Liaison série ===
    pub port: String,
    pub baud_rate: u32,
    /// Délai après ouverture du port (reset de la carte).
    pub settle_ms: u64,
    /// Durée d'allumage de la LED.
    pub led_pulse_ms: u64,

    // === Stockage ===
    pub store_dir: PathBuf,
    /// Nom sous lequel l'enregistrement courant est sauvegardé.
    pub recording_name: String,
    /// Nom de la série de référence.
    pub reference_name: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 30,
            sampling_rate_hz: 10,
            tick_ms: 100,
            window_size_samples: None,
            tolerance: 3.0,
            exclusion_band: [279.0, 283.0],
            trials: 5,
            min_common_points: 4,
            seed: None,
            expected_credential: "69 DC FC D5".to_string(),
            credential_timeout_secs: 0,
            port: default_port().to_string(),
            baud_rate: 9600,
            settle_ms: 2000,
            led_pulse_ms: 2000,
            store_dir: PathBuf::from("recordings"),
            recording_name: "Data_2".to_string(),
            reference_name: "Data_1".to_string(),
        }
    }
}

/// Une heure d'enregistrement au plus.
pub const MAX_DURATION_SECONDS: u32 = 3600;
/// Au-delà, une liaison série à 9600 bauds ne suit plus.
pub const MAX_SAMPLING_RATE_HZ: u32 = 1000;

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM7"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyACM0"
}

impl GateConfig {
    /// Capacité du buffer : `sampling_rate_hz * duration_seconds`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        (self.sampling_rate_hz as usize).saturating_mul(self.duration_seconds as usize)
    }

    /// Taille de fenêtre effective.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size_samples
            .unwrap_or(5 * self.sampling_rate_hz as usize)
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// `None` when waiting for a badge is unbounded.
    #[must_use]
    pub fn credential_timeout(&self) -> Option<Duration> {
        (self.credential_timeout_secs > 0)
            .then(|| Duration::from_secs(self.credential_timeout_secs))
    }

    /// Clamp numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.duration_seconds = self.duration_seconds.min(MAX_DURATION_SECONDS);
        self.sampling_rate_hz = self.sampling_rate_hz.min(MAX_SAMPLING_RATE_HZ);
        self.tick_ms = self.tick_ms.clamp(10, 1000);
        // NaN passe tel quel : `validate` le rejette.
        if self.tolerance < 0.0 {
            self.tolerance = 0.0;
        }
        self.led_pulse_ms = self.led_pulse_ms.min(10_000);
        self.settle_ms = self.settle_ms.min(10_000);
    }

    /// Reject values that cannot be clamped into something meaningful.
    ///
    /// # Errors
    /// Returns `CoreError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let bad = |msg: &str| Err(CoreError::Config(msg.to_string()));
        if self.duration_seconds == 0 {
            return bad("duration_seconds doit être > 0");
        }
        if self.sampling_rate_hz == 0 {
            return bad("sampling_rate_hz doit être > 0");
        }
        if self.trials == 0 {
            return bad("trials doit être > 0");
        }
        let window = self.window_size();
        if window == 0 {
            return bad("window_size_samples doit être > 0");
        }
        if window > self.capacity() {
            return Err(CoreError::Config(format!(
                "window_size_samples ({window}) dépasse la capacité du buffer ({})",
                self.capacity()
            )));
        }
        let [low, high] = self.exclusion_band;
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(CoreError::Config(format!(
                "exclusion_band invalide : [{low}, {high}]"
            )));
        }
        if !self.tolerance.is_finite() {
            return bad("tolerance doit être finie");
        }
        if self.expected_credential.trim().is_empty() {
            return bad("expected_credential est vide");
        }
        if self.recording_name == self.reference_name {
            return bad("recording_name et reference_name doivent différer");
        }
        if self.min_common_points > window {
            log::warn!(
                "min_common_points ({}) > taille de fenêtre ({window}) : aucune correspondance possible",
                self.min_common_points
            );
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    recording: Option<RecordingSection>,
    matching: Option<MatchingSection>,
    credential: Option<CredentialSection>,
    link: Option<LinkSection>,
    store: Option<StoreSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordingSection {
    duration_seconds: Option<u32>,
    sampling_rate_hz: Option<u32>,
    tick_ms: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchingSection {
    window_size_samples: Option<usize>,
    tolerance: Option<f64>,
    exclusion_band: Option<[f64; 2]>,
    trials: Option<u32>,
    min_common_points: Option<usize>,
    seed: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialSection {
    expected_credential: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkSection {
    port: Option<String>,
    baud_rate: Option<u32>,
    settle_ms: Option<u64>,
    led_pulse_ms: Option<u64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreSection {
    dir: Option<PathBuf>,
    recording_name: Option<String>,
    reference_name: Option<String>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or fails validation.
///
/// # Example
/// ```no_run
/// use sg_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<GateConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Configuration rejetée : {}", path.display()))
}

/// Parse un contenu TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error on TOML syntax errors, unknown keys, or invalid values.
pub fn parse_config(content: &str) -> Result<GateConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = GateConfig::default();

    if let Some(r) = file.recording {
        if let Some(v) = r.duration_seconds {
            config.duration_seconds = v;
        }
        if let Some(v) = r.sampling_rate_hz {
            config.sampling_rate_hz = v;
        }
        if let Some(v) = r.tick_ms {
            config.tick_ms = v;
        }
    }

    if let Some(m) = file.matching {
        if m.window_size_samples.is_some() {
            config.window_size_samples = m.window_size_samples;
        }
        if let Some(v) = m.tolerance {
            config.tolerance = v;
        }
        if let Some(v) = m.exclusion_band {
            config.exclusion_band = v;
        }
        if let Some(v) = m.trials {
            config.trials = v;
        }
        if let Some(v) = m.min_common_points {
            config.min_common_points = v;
        }
        if m.seed.is_some() {
            config.seed = m.seed;
        }
    }

    if let Some(c) = file.credential {
        if let Some(v) = c.expected_credential {
            config.expected_credential = v;
        }
        if let Some(v) = c.timeout_secs {
            config.credential_timeout_secs = v;
        }
    }

    if let Some(l) = file.link {
        if let Some(v) = l.port {
            config.port = v;
        }
        if let Some(v) = l.baud_rate {
            config.baud_rate = v;
        }
        if let Some(v) = l.settle_ms {
            config.settle_ms = v;
        }
        if let Some(v) = l.led_pulse_ms {
            config.led_pulse_ms = v;
        }
    }

    if let Some(s) = file.store {
        if let Some(v) = s.dir {
            config.store_dir = v;
        }
        if let Some(v) = s.recording_name {
            config.recording_name = v;
        }
        if let Some(v) = s.reference_name {
            config.reference_name = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick(), Duration::from_millis(100));
        assert_eq!(config.credential_timeout(), None);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.duration_seconds, 30);
        assert_eq!(config.exclusion_band, [279.0, 283.0]);
    }

    #[test]
    fn partial_override_keeps_other_keys() {
        let config = parse_config(
            r#"
            [recording]
            sampling_rate_hz = 20

            [matching]
            tolerance = 1.5
            seed = 7

            [credential]
            expected_credential = "04 A1 B2 C3"
            "#,
        )
        .unwrap();
        assert_eq!(config.sampling_rate_hz, 20);
        assert_eq!(config.duration_seconds, 30, "untouched key keeps its default");
        assert_eq!(config.window_size(), 100, "window follows the sampling rate");
        assert!((config.tolerance - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.expected_credential, "04 A1 B2 C3");
        assert_eq!(config.reference_name, "Data_1");
    }

    #[test]
    fn out_of_range_tick_is_clamped() {
        let config = parse_config("[recording]\ntick_ms = 1").unwrap();
        assert_eq!(config.tick_ms, 10);
    }

    #[test]
    fn huge_duration_and_rate_are_clamped() {
        let config = parse_config(
            "[recording]\nduration_seconds = 4000000000\nsampling_rate_hz = 4000000000",
        )
        .unwrap();
        assert_eq!(config.duration_seconds, MAX_DURATION_SECONDS);
        assert_eq!(config.sampling_rate_hz, MAX_SAMPLING_RATE_HZ);
        assert_eq!(config.capacity(), 3_600_000);
    }

    #[test]
    fn nan_tolerance_is_rejected() {
        let err = parse_config("[matching]\ntolerance = nan").unwrap_err();
        assert!(format!("{err:#}").contains("tolerance"));
    }

    #[test]
    fn negative_tolerance_is_clamped_to_zero() {
        let config = parse_config("[matching]\ntolerance = -2.0").unwrap();
        assert!(config.tolerance.abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_band_is_rejected() {
        assert!(parse_config("[matching]\nexclusion_band = [283.0, 279.0]").is_err());
    }

    #[test]
    fn zero_trials_is_rejected() {
        assert!(parse_config("[matching]\ntrials = 0").is_err());
    }

    #[test]
    fn window_larger_than_buffer_is_rejected() {
        let err = parse_config(
            "[recording]\nduration_seconds = 2\n[matching]\nwindow_size_samples = 50",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("window_size_samples"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_config("[matching]\ntolerence = 3.0").is_err());
    }
}
