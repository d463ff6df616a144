use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use sg_analysis::matcher::{MatchParams, match_windows};
use sg_analysis::{AnalysisError, extract_outliers};
use sg_capture::acquisition::run_acquisition;
use sg_capture::countdown::{CountdownOutcome, run_countdown};
use sg_capture::{CaptureError, SampleBuffer};
use sg_core::config::GateConfig;
use sg_core::series::{MatchResult, OutlierReport, RecordedSeries};
use sg_core::stop::StopSignal;
use sg_core::traits::{Actuator, CredentialSource, ProgressSink, SensorSource, SeriesStore};
use thiserror::Error;

/// Étapes d'une session. Aucune n'est visitée deux fois.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    AwaitingCredential,
    Recording,
    Persisting,
    Analyzing,
    Done,
    Rejected,
}

/// Errors that abort a session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No badge was presented in time.
    #[error("Aucun badge présenté en {0:?}")]
    CredentialTimeout(Duration),

    /// Stop requested before recording started.
    #[error("Session interrompue avant l'enregistrement")]
    Interrupted,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The acquisition thread panicked.
    #[error("Le thread d'acquisition a paniqué")]
    AcquisitionPanicked,

    /// Saving or loading a named series failed.
    #[error("Stockage de la série '{name}'")]
    Store {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Ce qu'une session a produit, jusqu'à l'état final.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub state: SessionState,
    pub history: Vec<SessionState>,
    pub recording: Option<RecordedSeries>,
    pub outliers: Option<OutlierReport>,
    pub matching: Option<MatchResult>,
}

impl SessionOutcome {
    /// `true` when the badge was accepted and the recording matched the reference.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.matching.is_some_and(|m| m.matched)
    }
}

/// Enchaîne badge → enregistrement → sauvegarde → analyse → LED.
///
/// Le matériel appartient à l'appelant : il est relâché par son `Drop`,
/// quelle que soit l'issue de `run`.
pub struct Session<'a> {
    config: &'a GateConfig,
    stop: Arc<StopSignal>,
    rng: fastrand::Rng,
    countdown_tick: Duration,
    state: SessionState,
    history: Vec<SessionState>,
}

impl<'a> Session<'a> {
    /// `stop` est le verrou partagé avec le gestionnaire Ctrl-C.
    #[must_use]
    pub fn new(config: &'a GateConfig, stop: Arc<StopSignal>, rng: fastrand::Rng) -> Self {
        Self {
            config,
            stop,
            rng,
            countdown_tick: Duration::from_secs(1),
            state: SessionState::AwaitingCredential,
            history: vec![SessionState::AwaitingCredential],
        }
    }

    /// Période du compte à rebours (une seconde hors tests).
    #[must_use]
    pub fn with_countdown_tick(mut self, tick: Duration) -> Self {
        self.countdown_tick = tick;
        self
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(!self.history.contains(&next), "état {next:?} déjà visité");
        log::info!("Session : {:?} → {next:?}", self.state);
        self.state = next;
        self.history.push(next);
    }

    fn outcome(self) -> SessionOutcome {
        SessionOutcome {
            state: self.state,
            history: self.history,
            recording: None,
            outliers: None,
            matching: None,
        }
    }

    /// Exécute la session complète.
    ///
    /// # Errors
    /// See [`SessionError`]. A wrong badge is not an error: the outcome ends
    /// in `SessionState::Rejected`.
    pub fn run<H, P, S>(
        mut self,
        hw: &mut H,
        progress: &mut P,
        store: &S,
    ) -> Result<SessionOutcome, SessionError>
    where
        H: CredentialSource + SensorSource + Actuator,
        P: ProgressSink,
        S: SeriesStore,
    {
        let config = self.config;

        // --- AwaitingCredential ---
        let credential = self.await_credential(hw)?;
        if credential.trim() != config.expected_credential.trim() {
            log::warn!("Mauvais badge : {credential}");
            self.transition(SessionState::Rejected);
            return Ok(self.outcome());
        }
        log::info!("Badge reconnu : {credential}");
        hw.signal();

        // --- Recording ---
        self.transition(SessionState::Recording);
        let (series, countdown) = self.record(hw, progress)?;
        if countdown == CountdownOutcome::Interrupted {
            log::warn!(
                "Enregistrement interrompu après {} lectures, rien n'est sauvegardé",
                series.len()
            );
            self.transition(SessionState::Done);
            let mut outcome = self.outcome();
            outcome.recording = Some(series);
            return Ok(outcome);
        }

        // --- Persisting ---
        self.transition(SessionState::Persisting);
        let recording_name = &config.recording_name;
        store
            .save(recording_name, &series)
            .map_err(|e| SessionError::Store {
                name: recording_name.clone(),
                source: Box::new(e),
            })?;

        // --- Analyzing ---
        self.transition(SessionState::Analyzing);
        let reference_name = &config.reference_name;
        let reference = store.load(reference_name).map_err(|e| SessionError::Store {
            name: reference_name.clone(),
            source: Box::new(e),
        })?;
        let params = MatchParams::from_config(config);
        let (outliers, matching) = analyze(&series, &reference, &params, &mut self.rng)?;
        if matching.matched {
            hw.signal();
        }

        self.transition(SessionState::Done);
        let mut outcome = self.outcome();
        outcome.recording = Some(series);
        outcome.outliers = outliers;
        outcome.matching = Some(matching);
        Ok(outcome)
    }

    /// Scrute le lecteur à chaque tick jusqu'au premier identifiant.
    fn await_credential<C: CredentialSource>(&self, source: &mut C) -> Result<String, SessionError> {
        log::info!("En attente d'un badge…");
        let started = Instant::now();
        let timeout = self.config.credential_timeout();
        loop {
            if let Some(id) = source.try_read() {
                return Ok(id);
            }
            if let Some(limit) = timeout
                && started.elapsed() >= limit
            {
                return Err(SessionError::CredentialTimeout(limit));
            }
            if self.stop.wait_timeout(self.config.tick()) {
                return Err(SessionError::Interrupted);
            }
        }
    }

    /// Acquisition et compte à rebours en parallèle, jointes avant toute lecture du buffer.
    fn record<S, P>(
        &self,
        sensor: &mut S,
        progress: &mut P,
    ) -> Result<(RecordedSeries, CountdownOutcome), SessionError>
    where
        S: SensorSource,
        P: ProgressSink,
    {
        let mut buffer = SampleBuffer::with_capacity(self.config.capacity());
        let stop: &StopSignal = &self.stop;
        let tick = self.config.tick();
        let started = Instant::now();

        let countdown = thread::scope(|s| -> Result<CountdownOutcome, SessionError> {
            let buffer = &mut buffer;
            let acquisition = thread::Builder::new()
                .name("sg-acquisition".to_string())
                .spawn_scoped(s, move || run_acquisition(sensor, buffer, stop, tick, started))
                .map_err(CaptureError::Thread)?;

            let countdown = run_countdown(
                self.config.duration_seconds,
                progress,
                stop,
                self.countdown_tick,
            );
            acquisition
                .join()
                .map_err(|_| SessionError::AcquisitionPanicked)?;
            Ok(countdown?)
        })?;

        Ok((buffer.into_series(), countdown))
    }
}

/// Outliers (pour le rapport) puis comparaison fenêtrée.
///
/// Une série vide n'a pas d'outliers ; le comparateur la rejette ensuite.
///
/// # Errors
/// Propagates the matcher's `AnalysisError`.
pub fn analyze(
    series: &RecordedSeries,
    reference: &RecordedSeries,
    params: &MatchParams,
    rng: &mut fastrand::Rng,
) -> Result<(Option<OutlierReport>, MatchResult), AnalysisError> {
    let outliers = if series.is_empty() {
        log::warn!("Enregistrement vide : pas d'extraction d'outliers");
        None
    } else {
        let report = extract_outliers(series.values());
        log::info!(
            "{} outliers hors de [{:.2}, {:.2}] aux instants {:?}",
            report.len(),
            report.lower,
            report.upper,
            report.times(series.times())
        );
        Some(report)
    };

    let matching = match_windows(series.values(), reference.values(), params, rng)?;
    Ok((outliers, matching))
}
