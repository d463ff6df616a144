use thiserror::Error;

/// Errors originating from the analysis module.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    /// A series is shorter than one comparison window.
    #[error(
        "Données insuffisantes : fenêtre de {window_size} échantillons, \
         série courante {current}, référence {reference}"
    )]
    InsufficientData {
        /// Length of the current recording.
        current: usize,
        /// Length of the reference series.
        reference: usize,
        /// Requested window length.
        window_size: usize,
    },

    /// Matching parameters that make the comparison meaningless.
    #[error("Paramètres de comparaison invalides : {0}")]
    InvalidParams(String),
}
