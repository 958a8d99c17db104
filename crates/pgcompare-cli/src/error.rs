//! CLI error types.

use pgcompare_core::ObjectKind;
use pgcompare_loader::LoadError;
use thiserror::Error;

/// Errors reported by the command-line client.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading a catalog failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// JSON rendering failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Object argument is not of the form `namespace.name`.
    #[error("invalid object '{0}': expected namespace.name")]
    InvalidObject(String),

    /// No object of the requested kind and name.
    #[error("{kind} '{object}' not found")]
    ObjectNotFound {
        /// Requested kind.
        kind: ObjectKind,
        /// Requested `namespace.name`.
        object: String,
    },
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
