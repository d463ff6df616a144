use std::time::Duration;

use sg_core::stop::StopSignal;
use sg_core::traits::ProgressSink;

use crate::error::CaptureError;

/// Comment le compte à rebours s'est terminé.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// Le compteur a atteint zéro ; c'est lui qui a levé l'arrêt.
    Elapsed,
    /// L'arrêt était déjà levé (Ctrl-C, autre unité).
    Interrupted,
}

/// Lève le signal d'arrêt quoi qu'il arrive, y compris en cas de panique.
struct RaiseOnDrop<'a>(&'a StopSignal);

impl Drop for RaiseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.raise();
    }
}

/// Décompte `duration_secs` ticks en rapportant le temps restant, puis lève l'arrêt.
///
/// Le sink reçoit `duration_secs, …, 1`, un appel par tick. Le signal est
/// vérifié avant chaque rapport et l'attente se réveille s'il est levé.
/// Toutes les sorties, erreurs et paniques comprises, laissent le signal levé.
///
/// # Errors
/// Returns `CaptureError::Progress` if the sink fails; the stop signal is
/// already raised when the error is returned.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use sg_capture::countdown::{run_countdown, CountdownOutcome};
/// use sg_core::stop::StopSignal;
/// use sg_core::traits::ProgressSink;
///
/// struct Quiet;
/// impl ProgressSink for Quiet {
///     fn report(&mut self, _: u32) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// let stop = StopSignal::new();
/// let outcome = run_countdown(2, &mut Quiet, &stop, Duration::from_millis(1)).unwrap();
/// assert_eq!(outcome, CountdownOutcome::Elapsed);
/// assert!(stop.is_raised());
/// ```
pub fn run_countdown(
    duration_secs: u32,
    progress: &mut dyn ProgressSink,
    stop: &StopSignal,
    tick: Duration,
) -> Result<CountdownOutcome, CaptureError> {
    let _guard = RaiseOnDrop(stop);

    for remaining in (1..=duration_secs).rev() {
        if stop.is_raised() {
            log::info!("Compte à rebours interrompu à {remaining} s");
            return Ok(CountdownOutcome::Interrupted);
        }
        progress.report(remaining).map_err(CaptureError::Progress)?;
        if stop.wait_timeout(tick) {
            log::info!("Compte à rebours interrompu à {remaining} s");
            return Ok(CountdownOutcome::Interrupted);
        }
    }

    stop.raise();
    log::info!("Compte à rebours terminé");
    Ok(CountdownOutcome::Elapsed)
}
