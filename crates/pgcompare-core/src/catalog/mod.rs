//! Catalog entity model.
//!
//! A [`Database`] is one source's immutable snapshot of `pg_catalog`,
//! assembled through a [`DatabaseBuilder`]. Objects refer to each other by
//! typed arena ids; comparison across snapshots goes through
//! [`FlatKey`]s.

mod database;
mod flat;
mod ids;
mod keys;
mod objects;
mod xref;

pub use database::{
    source_label, ConstraintOwner, Database, DatabaseBuilder, SYSTEM_NAMESPACE_PREFIX,
};
pub use flat::FlatKey;
pub use ids::{
    ColumnId, ConstraintId, FunctionId, LanguageId, NamespaceId, ObjectId, ObjectKind,
    OperatorClassId, OperatorId, RelationId, RuleId, SequenceId, TriggerId, TypeId,
};
pub use objects::{
    Column, Constraint, ConstraintKind, DomainInfo, Function, Language, Namespace, Operator,
    OperatorClass, Relation, RelationKind, Rule, Sequence, Trigger, Type,
};
pub use xref::XrefIndex;
