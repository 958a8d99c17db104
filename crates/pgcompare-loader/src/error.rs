//! Loader error types.

use pgcompare_core::CatalogError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading a catalog snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Could not open a connection.
    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    /// Connecting took longer than the configured timeout.
    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// A catalog query failed.
    #[error("catalog query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// A row referenced an oid that was not loaded.
    #[error("unresolved {kind} oid {oid}")]
    UnresolvedOid {
        /// Kind of the referenced object.
        kind: &'static str,
        /// The dangling oid.
        oid: i64,
    },

    /// A constraint referenced a column number the relation does not have.
    #[error("relation oid {relation} has no column {position}")]
    UnresolvedColumn {
        /// Relation oid.
        relation: i64,
        /// Attribute number.
        position: i16,
    },

    /// The loaded objects violate a catalog invariant.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// A load task panicked or was cancelled.
    #[error("load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Failure of one source in a multi-source load.
    #[error("{database}: {error}")]
    Source {
        /// Display label of the failing source.
        database: String,
        /// Underlying failure.
        #[source]
        error: Box<LoadError>,
    },
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;
