use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use sg_analysis::matcher::MatchParams;
use sg_capture::serial::SerialLink;
use sg_core::config::GateConfig;
use sg_core::stop::StopSignal;
use sg_core::traits::SeriesStore;
use sg_store::JsonSeriesStore;

pub mod cli;
pub mod progress;
pub mod report;
pub mod session;

use session::{Session, SessionOutcome, SessionState};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config, puis les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config)?;

    let store = JsonSeriesStore::new(&config.store_dir);
    log::info!("Séries stockées dans {}", store.dir().display());

    match cli.command {
        Some(cli::Command::Compare { .. }) => run_compare(&cli, &config, &store),
        None => run_session(&cli, &config, &store),
    }
}

/// Session matérielle complète : badge, enregistrement, analyse.
fn run_session(cli: &cli::Cli, config: &GateConfig, store: &JsonSeriesStore) -> Result<()> {
    // 4. Verrou d'arrêt partagé avec Ctrl-C
    let stop = Arc::new(StopSignal::new());
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            if stop.raise() {
                log::warn!("Interruption demandée");
            }
        })
        .context("Impossible d'installer le gestionnaire Ctrl-C")?;
    }

    // 5. Ouvrir la liaison série. Échec = fatal, avant toute attente de badge.
    let mut link = SerialLink::open(
        &config.port,
        config.baud_rate,
        Duration::from_millis(config.settle_ms),
        Duration::from_millis(config.led_pulse_ms),
    )?;

    eprintln!("En attente d'un badge sur {}…", link.port_name());
    let session = Session::new(config, stop, make_rng(config));

    // 6. Session ; le port est relâché au Drop de `link`, succès ou erreur
    let outcome = if cli.tui {
        let mut progress = progress::GaugeProgress::new(config.duration_seconds)?;
        session.run(&mut link, &mut progress, store)
    } else {
        session.run(&mut link, &mut progress::ConsoleProgress, store)
    }?;

    print_summary(&outcome);

    if let Some(ref path) = cli.report {
        report::write_report(path, &outcome, config)?;
    }
    Ok(())
}

/// Comparaison hors ligne de deux séries stockées.
fn run_compare(cli: &cli::Cli, config: &GateConfig, store: &JsonSeriesStore) -> Result<()> {
    let recording = store
        .load(&config.recording_name)
        .with_context(|| format!("Chargement de '{}'", config.recording_name))?;
    let reference = store
        .load(&config.reference_name)
        .with_context(|| format!("Chargement de '{}'", config.reference_name))?;

    let params = MatchParams::from_config(config);
    let (outliers, matching) =
        session::analyze(&recording, &reference, &params, &mut make_rng(config))?;

    let outcome = SessionOutcome {
        state: SessionState::Done,
        history: vec![SessionState::Analyzing, SessionState::Done],
        recording: Some(recording),
        outliers,
        matching: Some(matching),
    };
    print_summary(&outcome);

    if let Some(ref path) = cli.report {
        report::write_report(path, &outcome, config)?;
    }
    Ok(())
}

fn make_rng(config: &GateConfig) -> fastrand::Rng {
    config
        .seed
        .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
}

fn print_summary(outcome: &SessionOutcome) {
    if outcome.state == SessionState::Rejected {
        println!("Badge refusé.");
        return;
    }
    if let (Some(recording), Some(outliers)) = (&outcome.recording, &outcome.outliers) {
        println!(
            "{} échantillons enregistrés, {} outliers hors de [{:.2}, {:.2}].",
            recording.len(),
            outliers.len(),
            outliers.lower,
            outliers.upper
        );
    }
    match outcome.matching {
        Some(m) if outcome.matched() => println!(
            "Correspondance dans la fenêtre {} ({} points communs) : les enregistrements représentent probablement le même son.",
            m.window_index.unwrap_or_default(),
            m.common_points
        ),
        Some(m) => println!(
            "Aucune des {} fenêtres n'a assez de points communs.",
            m.trials_run
        ),
        None => println!("Enregistrement interrompu, aucune analyse."),
    }
}

/// Charge la config si elle existe, sinon les défauts.
fn resolve_config(cli: &cli::Cli) -> Result<GateConfig> {
    if cli.config.exists() {
        sg_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(GateConfig::default())
    }
}
