//! Typed arena ids and the closed set of catalog object kinds.

use serde::Serialize;
use std::fmt;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            /// Position of the object in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Id of a [`Language`](super::Language).
    LanguageId
);
arena_id!(
    /// Id of a [`Namespace`](super::Namespace).
    NamespaceId
);
arena_id!(
    /// Id of a [`Type`](super::Type) or domain.
    TypeId
);
arena_id!(
    /// Id of a [`Relation`](super::Relation).
    RelationId
);
arena_id!(
    /// Id of a [`Column`](super::Column).
    ColumnId
);
arena_id!(
    /// Id of a [`Sequence`](super::Sequence).
    SequenceId
);
arena_id!(
    /// Id of a [`Function`](super::Function).
    FunctionId
);
arena_id!(
    /// Id of an [`Operator`](super::Operator).
    OperatorId
);
arena_id!(
    /// Id of an [`OperatorClass`](super::OperatorClass).
    OperatorClassId
);
arena_id!(
    /// Id of a [`Constraint`](super::Constraint).
    ConstraintId
);
arena_id!(
    /// Id of a [`Trigger`](super::Trigger).
    TriggerId
);
arena_id!(
    /// Id of a [`Rule`](super::Rule).
    RuleId
);

/// Any object of one snapshot.
///
/// Ids are only meaningful against the [`Database`](super::Database) that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ObjectId {
    Language(LanguageId),
    Namespace(NamespaceId),
    Type(TypeId),
    Relation(RelationId),
    Column(ColumnId),
    Sequence(SequenceId),
    Function(FunctionId),
    Operator(OperatorId),
    OperatorClass(OperatorClassId),
    Constraint(ConstraintId),
    Trigger(TriggerId),
    Rule(RuleId),
}

/// Concrete entity kind.
///
/// Every kind has exactly one diff node shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Language,
    Namespace,
    Type,
    Domain,
    Function,
    Composite,
    Index,
    View,
    Table,
    Sequence,
    Column,
    CheckConstraint,
    UniqueConstraint,
    CheckColumnConstraint,
    UniqueColumnConstraint,
    PrimaryKey,
    ForeignKey,
    Trigger,
    Rule,
    Operator,
    OperatorClass,
}

impl ObjectKind {
    /// Lower-case label used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Language => "language",
            ObjectKind::Namespace => "namespace",
            ObjectKind::Type => "type",
            ObjectKind::Domain => "domain",
            ObjectKind::Function => "function",
            ObjectKind::Composite => "composite",
            ObjectKind::Index => "index",
            ObjectKind::View => "view",
            ObjectKind::Table => "table",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Column => "column",
            ObjectKind::CheckConstraint => "check-constraint",
            ObjectKind::UniqueConstraint => "unique-constraint",
            ObjectKind::CheckColumnConstraint => "check-column-constraint",
            ObjectKind::UniqueColumnConstraint => "unique-column-constraint",
            ObjectKind::PrimaryKey => "primary-key",
            ObjectKind::ForeignKey => "foreign-key",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Rule => "rule",
            ObjectKind::Operator => "operator",
            ObjectKind::OperatorClass => "operator-class",
        }
    }

    /// Kinds whose structural flat key covers every diffed attribute.
    ///
    /// Equal flat keys for these kinds imply an empty diff.
    pub fn is_leaf(self) -> bool {
        !matches!(
            self,
            ObjectKind::Namespace
                | ObjectKind::Domain
                | ObjectKind::Composite
                | ObjectKind::Index
                | ObjectKind::View
                | ObjectKind::Table
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_kebab_case() {
        assert_eq!(ObjectKind::OperatorClass.to_string(), "operator-class");
        assert_eq!(ObjectKind::PrimaryKey.as_str(), "primary-key");
    }

    #[test]
    fn test_container_kinds_are_not_leaves() {
        assert!(ObjectKind::Column.is_leaf());
        assert!(ObjectKind::Function.is_leaf());
        assert!(!ObjectKind::Table.is_leaf());
        assert!(!ObjectKind::Domain.is_leaf());
    }

    #[test]
    fn test_object_ids_order_by_kind_then_index() {
        let a = ObjectId::Type(TypeId::from_index(5));
        let b = ObjectId::Relation(RelationId::from_index(0));
        assert!(a < b);
        assert_eq!(TypeId::from_index(5).index(), 5);
    }
}
