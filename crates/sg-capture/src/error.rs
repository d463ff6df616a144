use thiserror::Error;

/// Errors originating from the capture module.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The serial link could not be opened at startup.
    #[error("Liaison série indisponible sur {port} : {reason}")]
    LinkUnavailable {
        /// Port that failed to open.
        port: String,
        /// Underlying cause.
        reason: String,
    },

    /// The progress sink failed during the countdown.
    #[error("Erreur d'affichage du compte à rebours : {0}")]
    Progress(#[source] anyhow::Error),

    /// A capture thread could not be spawned.
    #[error("Impossible de lancer le thread de capture : {0}")]
    Thread(#[from] std::io::Error),
}
