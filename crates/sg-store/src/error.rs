use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from the store module.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No series stored under that name.
    #[error("Série introuvable : {name}")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// Name that cannot be used as a storage key.
    #[error("Nom de série invalide : {name:?}")]
    InvalidName {
        /// Rejected name.
        name: String,
    },

    /// Filesystem failure.
    #[error("Erreur d'E/S sur {path}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },

    /// File content is not a valid series.
    #[error("Contenu invalide dans {path}")]
    Format {
        /// File involved.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: serde_json::Error,
    },
}
