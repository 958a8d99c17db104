//! Catalog entities.
//!
//! Entities are plain values built by the loader and handed to a
//! [`DatabaseBuilder`](super::DatabaseBuilder). References to other objects
//! are arena ids, never owning pointers.

use super::flat::KeyCache;
use super::ids::{
    ColumnId, ConstraintId, FunctionId, LanguageId, NamespaceId, ObjectKind, OperatorClassId,
    OperatorId, RelationId, RuleId, SequenceId, TriggerId, TypeId,
};
use std::collections::BTreeMap;

/// A procedural language.
#[derive(Debug, Clone)]
pub struct Language {
    /// Language name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    pub(crate) keys: KeyCache,
}

impl Language {
    /// Create a new language.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            keys: KeyCache::default(),
        }
    }
}

/// A schema (namespace) and the objects listed in it.
#[derive(Debug, Clone)]
pub struct Namespace {
    /// Namespace name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Listed base types and domains.
    pub types: Vec<TypeId>,
    /// Composite types.
    pub composites: Vec<RelationId>,
    /// Indexes.
    pub indexes: Vec<RelationId>,
    /// Tables.
    pub tables: Vec<RelationId>,
    /// Views.
    pub views: Vec<RelationId>,
    /// Sequences.
    pub sequences: Vec<SequenceId>,
    /// Functions.
    pub functions: Vec<FunctionId>,
    /// Operators.
    pub operators: Vec<OperatorId>,
    /// Operator classes.
    pub opclasses: Vec<OperatorClassId>,
    pub(crate) keys: KeyCache,
}

impl Namespace {
    /// Create an empty namespace.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            types: Vec::new(),
            composites: Vec::new(),
            indexes: Vec::new(),
            tables: Vec::new(),
            views: Vec::new(),
            sequences: Vec::new(),
            functions: Vec::new(),
            operators: Vec::new(),
            opclasses: Vec::new(),
            keys: KeyCache::default(),
        }
    }

    /// All relations of the namespace, in one kind-group.
    pub fn relations(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.composites
            .iter()
            .chain(&self.indexes)
            .chain(&self.tables)
            .chain(&self.views)
            .copied()
    }
}

/// Domain-specific part of a [`Type`].
#[derive(Debug, Clone, Default)]
pub struct DomainInfo {
    /// Underlying type; set once all types are known.
    pub base_type: Option<TypeId>,
    /// Check/unique constraints of the domain.
    pub constraints: Vec<ConstraintId>,
}

/// A data type. Domains carry [`DomainInfo`].
#[derive(Debug, Clone)]
pub struct Type {
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Type name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Whether the type rejects NULL.
    pub notnull: bool,
    /// Default expression.
    pub default: Option<String>,
    /// Present for domains.
    pub domain: Option<DomainInfo>,
    pub(crate) keys: KeyCache,
}

impl Type {
    /// Create a base type.
    pub fn new(namespace: NamespaceId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            owner: owner.into(),
            notnull: false,
            default: None,
            domain: None,
            keys: KeyCache::default(),
        }
    }

    /// Create a domain. The base type may be bound later.
    pub fn domain(
        namespace: NamespaceId,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        let mut ty = Self::new(namespace, name, owner);
        ty.domain = Some(DomainInfo::default());
        ty
    }

    /// Mark as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.notnull = true;
        self
    }

    /// Set the default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Bind the base type of a domain. No effect on base types.
    pub fn with_base_type(mut self, base: TypeId) -> Self {
        if let Some(domain) = self.domain.as_mut() {
            domain.base_type = Some(base);
        }
        self
    }

    /// Check if this type is a domain.
    pub fn is_domain(&self) -> bool {
        self.domain.is_some()
    }

    /// Concrete kind.
    pub fn kind(&self) -> ObjectKind {
        if self.is_domain() {
            ObjectKind::Domain
        } else {
            ObjectKind::Type
        }
    }
}

/// A function or procedure.
#[derive(Debug, Clone)]
pub struct Function {
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Function name (without arguments).
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Implementation language.
    pub language: LanguageId,
    /// Return type.
    pub return_type: TypeId,
    /// Argument types in declaration order.
    pub arg_types: Vec<TypeId>,
    /// Source text (`prosrc`).
    pub source: Option<String>,
    /// Link symbol or object file (`probin`).
    pub binary: Option<String>,
    pub(crate) signature: String,
    pub(crate) keys: KeyCache,
}

impl Function {
    /// Create a function without arguments.
    pub fn new(
        namespace: NamespaceId,
        name: impl Into<String>,
        owner: impl Into<String>,
        language: LanguageId,
        return_type: TypeId,
    ) -> Self {
        Self {
            namespace,
            name: name.into(),
            owner: owner.into(),
            language,
            return_type,
            arg_types: Vec::new(),
            source: None,
            binary: None,
            signature: String::new(),
            keys: KeyCache::default(),
        }
    }

    /// Set the argument types.
    pub fn with_arg_types(mut self, arg_types: impl IntoIterator<Item = TypeId>) -> Self {
        self.arg_types = arg_types.into_iter().collect();
        self
    }

    /// Set the source text.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the binary reference.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Signature `name(argtype, ...)`, assigned when added to a database.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// Relation flavours sharing one name space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Composite type backing relation.
    Composite,
    /// Index.
    Index,
    /// Ordinary, partitioned or foreign table.
    Table,
    /// View or materialized view.
    View,
}

impl RelationKind {
    /// Concrete entity kind.
    pub fn object_kind(self) -> ObjectKind {
        match self {
            RelationKind::Composite => ObjectKind::Composite,
            RelationKind::Index => ObjectKind::Index,
            RelationKind::Table => ObjectKind::Table,
            RelationKind::View => ObjectKind::View,
        }
    }

    /// Whether the relation may own rules.
    pub fn has_rules(self) -> bool {
        matches!(self, RelationKind::Table | RelationKind::View)
    }
}

/// A relation: table, view, index or composite.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Relation flavour.
    pub kind: RelationKind,
    /// Relation name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Columns keyed by attribute number.
    pub columns: BTreeMap<i16, ColumnId>,
    /// Rewrite rules (tables and views).
    pub rules: Vec<RuleId>,
    /// Triggers (tables).
    pub triggers: Vec<TriggerId>,
    /// Constraints (tables).
    pub constraints: Vec<ConstraintId>,
    pub(crate) keys: KeyCache,
}

impl Relation {
    /// Create a relation without children.
    pub fn new(
        namespace: NamespaceId,
        kind: RelationKind,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            kind,
            name: name.into(),
            owner: owner.into(),
            columns: BTreeMap::new(),
            rules: Vec::new(),
            triggers: Vec::new(),
            constraints: Vec::new(),
            keys: KeyCache::default(),
        }
    }

    /// Create a table.
    pub fn table(
        namespace: NamespaceId,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::new(namespace, RelationKind::Table, name, owner)
    }

    /// Create a view.
    pub fn view(namespace: NamespaceId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::new(namespace, RelationKind::View, name, owner)
    }

    /// Create an index.
    pub fn index(
        namespace: NamespaceId,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::new(namespace, RelationKind::Index, name, owner)
    }

    /// Create a composite.
    pub fn composite(
        namespace: NamespaceId,
        name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::new(namespace, RelationKind::Composite, name, owner)
    }

    /// Columns in storage order.
    pub fn ordered_columns(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.columns.values().copied()
    }
}

/// A sequence generator.
#[derive(Debug, Clone)]
pub struct Sequence {
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Sequence name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Increment.
    pub increment: i64,
    /// Minimum value.
    pub minimum: i64,
    /// Maximum value.
    pub maximum: i64,
    pub(crate) keys: KeyCache,
}

impl Sequence {
    /// Create an ascending sequence with PostgreSQL defaults.
    pub fn new(namespace: NamespaceId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            owner: owner.into(),
            increment: 1,
            minimum: 1,
            maximum: i64::MAX,
            keys: KeyCache::default(),
        }
    }

    /// Set increment and bounds.
    pub fn with_range(mut self, increment: i64, minimum: i64, maximum: i64) -> Self {
        self.increment = increment;
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }
}

/// A relation column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Attribute number (storage position, 1-based).
    pub position: i16,
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: TypeId,
    /// Whether the column rejects NULL.
    pub notnull: bool,
    /// Default expression.
    pub default: Option<String>,
    pub(crate) keys: KeyCache,
}

impl Column {
    /// Create a nullable column without default.
    pub fn new(position: i16, name: impl Into<String>, data_type: TypeId) -> Self {
        Self {
            position,
            name: name.into(),
            data_type,
            notnull: false,
            default: None,
            keys: KeyCache::default(),
        }
    }

    /// Mark as NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.notnull = true;
        self
    }

    /// Set the default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Constraint flavour and its references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Domain check constraint.
    Check,
    /// Domain unique constraint.
    Unique,
    /// Table check constraint over columns.
    CheckColumns {
        /// Referenced columns.
        columns: Vec<ColumnId>,
    },
    /// Table unique constraint.
    UniqueColumns {
        /// Constrained columns.
        columns: Vec<ColumnId>,
    },
    /// Primary key.
    PrimaryKey {
        /// Key columns.
        columns: Vec<ColumnId>,
    },
    /// Foreign key.
    ForeignKey {
        /// Referencing columns.
        columns: Vec<ColumnId>,
        /// Referenced relation.
        foreign_table: RelationId,
        /// Referenced columns, parallel to `columns`.
        foreign_columns: Vec<ColumnId>,
    },
}

impl ConstraintKind {
    /// Concrete entity kind.
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            ConstraintKind::Check => ObjectKind::CheckConstraint,
            ConstraintKind::Unique => ObjectKind::UniqueConstraint,
            ConstraintKind::CheckColumns { .. } => ObjectKind::CheckColumnConstraint,
            ConstraintKind::UniqueColumns { .. } => ObjectKind::UniqueColumnConstraint,
            ConstraintKind::PrimaryKey { .. } => ObjectKind::PrimaryKey,
            ConstraintKind::ForeignKey { .. } => ObjectKind::ForeignKey,
        }
    }

    /// Constrained columns, empty for domain constraints.
    pub fn columns(&self) -> &[ColumnId] {
        match self {
            ConstraintKind::Check | ConstraintKind::Unique => &[],
            ConstraintKind::CheckColumns { columns }
            | ConstraintKind::UniqueColumns { columns }
            | ConstraintKind::PrimaryKey { columns }
            | ConstraintKind::ForeignKey { columns, .. } => columns,
        }
    }

    /// Whether this constraint belongs on a table rather than a domain.
    pub fn is_column_constraint(&self) -> bool {
        !matches!(self, ConstraintKind::Check | ConstraintKind::Unique)
    }
}

/// A table or domain constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// Definition as reported by the server.
    pub definition: String,
    /// Flavour and references.
    pub kind: ConstraintKind,
    pub(crate) keys: KeyCache,
}

impl Constraint {
    fn new(name: impl Into<String>, definition: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            kind,
            keys: KeyCache::default(),
        }
    }

    /// Domain check constraint.
    pub fn check(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::new(name, definition, ConstraintKind::Check)
    }

    /// Domain unique constraint.
    pub fn unique(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::new(name, definition, ConstraintKind::Unique)
    }

    /// Table check constraint.
    pub fn check_columns(
        name: impl Into<String>,
        definition: impl Into<String>,
        columns: impl IntoIterator<Item = ColumnId>,
    ) -> Self {
        let columns = columns.into_iter().collect();
        Self::new(name, definition, ConstraintKind::CheckColumns { columns })
    }

    /// Table unique constraint.
    pub fn unique_columns(
        name: impl Into<String>,
        definition: impl Into<String>,
        columns: impl IntoIterator<Item = ColumnId>,
    ) -> Self {
        let columns = columns.into_iter().collect();
        Self::new(name, definition, ConstraintKind::UniqueColumns { columns })
    }

    /// Primary key.
    pub fn primary_key(
        name: impl Into<String>,
        definition: impl Into<String>,
        columns: impl IntoIterator<Item = ColumnId>,
    ) -> Self {
        let columns = columns.into_iter().collect();
        Self::new(name, definition, ConstraintKind::PrimaryKey { columns })
    }

    /// Foreign key.
    pub fn foreign_key(
        name: impl Into<String>,
        definition: impl Into<String>,
        columns: impl IntoIterator<Item = ColumnId>,
        foreign_table: RelationId,
        foreign_columns: impl IntoIterator<Item = ColumnId>,
    ) -> Self {
        let kind = ConstraintKind::ForeignKey {
            columns: columns.into_iter().collect(),
            foreign_table,
            foreign_columns: foreign_columns.into_iter().collect(),
        };
        Self::new(name, definition, kind)
    }
}

/// A table trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    /// Trigger name.
    pub name: String,
    /// Function the trigger calls.
    pub function: FunctionId,
    /// `CREATE TRIGGER` text.
    pub definition: String,
    pub(crate) keys: KeyCache,
}

impl Trigger {
    /// Create a trigger.
    pub fn new(
        name: impl Into<String>,
        function: FunctionId,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            function,
            definition: definition.into(),
            keys: KeyCache::default(),
        }
    }
}

/// A rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Rule name.
    pub name: String,
    /// `CREATE RULE` text.
    pub definition: String,
    pub(crate) keys: KeyCache,
}

impl Rule {
    /// Create a rule.
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            keys: KeyCache::default(),
        }
    }
}

/// An operator.
#[derive(Debug, Clone)]
pub struct Operator {
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Operator symbol.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Left operand type (absent for prefix operators).
    pub left: Option<TypeId>,
    /// Right operand type.
    pub right: Option<TypeId>,
    /// Result type.
    pub result: Option<TypeId>,
    pub(crate) signature: String,
    pub(crate) keys: KeyCache,
}

impl Operator {
    /// Create an operator without operand types.
    pub fn new(namespace: NamespaceId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            owner: owner.into(),
            left: None,
            right: None,
            result: None,
            signature: String::new(),
            keys: KeyCache::default(),
        }
    }

    /// Set operand types.
    pub fn with_operands(mut self, left: Option<TypeId>, right: Option<TypeId>) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Set the result type.
    pub fn with_result(mut self, result: TypeId) -> Self {
        self.result = Some(result);
        self
    }

    /// Signature `name(left, right)`, assigned when added to a database.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

/// An index operator class.
#[derive(Debug, Clone)]
pub struct OperatorClass {
    /// Containing namespace.
    pub namespace: NamespaceId,
    /// Index access method.
    pub method: String,
    /// Class name.
    pub name: String,
    /// Owning role.
    pub owner: String,
    /// Indexed data type.
    pub input_type: TypeId,
    /// Whether this is the default class for `input_type`.
    pub default: bool,
    /// Stored key type when different from `input_type`.
    pub key_type: Option<TypeId>,
    pub(crate) label: String,
    pub(crate) keys: KeyCache,
}

impl OperatorClass {
    /// Create a non-default operator class.
    pub fn new(
        namespace: NamespaceId,
        method: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        input_type: TypeId,
    ) -> Self {
        Self {
            namespace,
            method: method.into(),
            name: name.into(),
            owner: owner.into(),
            input_type,
            default: false,
            key_type: None,
            label: String::new(),
            keys: KeyCache::default(),
        }
    }

    /// Mark as the default class for its input type.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Set the stored key type.
    pub fn with_key_type(mut self, key_type: TypeId) -> Self {
        self.key_type = Some(key_type);
        self
    }

    /// Collection label `name (method)`.
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_builder() {
        let ns = NamespaceId::from_index(0);
        let base = TypeId::from_index(3);
        let ty = Type::domain(ns, "email", "app")
            .not_null()
            .with_default("''")
            .with_base_type(base);

        assert!(ty.is_domain());
        assert_eq!(ty.kind(), ObjectKind::Domain);
        assert!(ty.notnull);
        assert_eq!(ty.domain.as_ref().and_then(|d| d.base_type), Some(base));
    }

    #[test]
    fn test_base_type_ignores_base_binding() {
        let ns = NamespaceId::from_index(0);
        let ty = Type::new(ns, "int4", "postgres").with_base_type(TypeId::from_index(1));
        assert!(!ty.is_domain());
        assert_eq!(ty.kind(), ObjectKind::Type);
    }

    #[test]
    fn test_constraint_kinds() {
        let a = ColumnId::from_index(0);
        let pk = Constraint::primary_key("t_pkey", "PRIMARY KEY (id)", [a]);
        assert_eq!(pk.kind.object_kind(), ObjectKind::PrimaryKey);
        assert_eq!(pk.kind.columns(), &[a]);
        assert!(pk.kind.is_column_constraint());

        let check = Constraint::check("positive", "CHECK (VALUE > 0)");
        assert!(!check.kind.is_column_constraint());
        assert!(check.kind.columns().is_empty());
    }

    #[test]
    fn test_namespace_relations_kind_group() {
        let mut ns = Namespace::new("public", "postgres");
        ns.tables.push(RelationId::from_index(0));
        ns.views.push(RelationId::from_index(1));
        ns.indexes.push(RelationId::from_index(2));
        assert_eq!(ns.relations().count(), 3);
    }
}
