//! Core error types.

use thiserror::Error;

/// Catalog construction errors.
///
/// Raised by [`DatabaseBuilder::finish`](crate::catalog::DatabaseBuilder::finish)
/// when the loaded object graph violates a model invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two objects of the same kind-group share a name in one container.
    #[error("duplicate {group} name {name:?} in {container}")]
    DuplicateName {
        /// Kind-group the collision happened in (e.g. "relation").
        group: &'static str,
        /// Colliding name.
        name: String,
        /// Qualified name of the owning container.
        container: String,
    },

    /// Two columns of one relation share a storage position.
    #[error("duplicate column position {position} in {relation}")]
    DuplicatePosition {
        /// Qualified relation name.
        relation: String,
        /// Attribute number.
        position: i16,
    },

    /// A domain was registered but never given a base type.
    #[error("domain {0} has no base type")]
    MissingBaseType(String),

    /// A child object was attached to a relation kind that cannot own it.
    #[error("{child} {name:?} cannot belong to {relation} ({kind})")]
    MisplacedChild {
        /// Child kind (constraint, trigger, rule).
        child: &'static str,
        /// Child name.
        name: String,
        /// Qualified relation or domain name.
        relation: String,
        /// Kind of the owner.
        kind: &'static str,
    },

    /// A constraint lists a column that belongs to a different relation.
    #[error("constraint {constraint:?} on {relation} references column of another relation")]
    ForeignColumn {
        /// Constraint name.
        constraint: String,
        /// Qualified relation name.
        relation: String,
    },
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
