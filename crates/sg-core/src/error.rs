use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Values and timestamps of a series have different lengths.
    #[error("Série incohérente : {values} valeurs pour {times} horodatages")]
    SeriesShape {
        /// Number of values.
        values: usize,
        /// Number of timestamps.
        times: usize,
    },
}
