//! Database snapshots and their builder.

use super::ids::{
    ColumnId, ConstraintId, FunctionId, LanguageId, NamespaceId, ObjectId, ObjectKind,
    OperatorClassId, OperatorId, RelationId, RuleId, SequenceId, TriggerId, TypeId,
};
use super::objects::{
    Column, Constraint, ConstraintKind, Function, Language, Namespace, Operator, OperatorClass,
    Relation, RelationKind, Rule, Sequence, Trigger, Type,
};
use super::xref::XrefIndex;
use crate::error::{CatalogError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Namespaces with this prefix are resolvable but never listed for diffing.
pub const SYSTEM_NAMESPACE_PREFIX: &str = "pg_";

/// Namespace whose types appear unqualified in signatures.
const BUILTIN_NAMESPACE: &str = "pg_catalog";

/// Owner of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOwner {
    /// Table constraint.
    Relation(RelationId),
    /// Domain constraint.
    Domain(TypeId),
}

/// One source's frozen catalog snapshot.
///
/// Objects live in per-kind arenas and are addressed by typed ids. Indexing
/// with an id issued by another database is a contract violation and panics.
#[derive(Debug)]
pub struct Database {
    source: String,
    label: String,
    pub(crate) languages: Vec<Language>,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) types: Vec<Type>,
    pub(crate) relations: Vec<Relation>,
    pub(crate) columns: Vec<Column>,
    pub(crate) sequences: Vec<Sequence>,
    pub(crate) functions: Vec<Function>,
    pub(crate) operators: Vec<Operator>,
    pub(crate) opclasses: Vec<OperatorClass>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) triggers: Vec<Trigger>,
    pub(crate) rules: Vec<Rule>,
    column_owner: Vec<RelationId>,
    constraint_owner: Vec<ConstraintOwner>,
    trigger_owner: Vec<RelationId>,
    rule_owner: Vec<RelationId>,
    listed_languages: Vec<LanguageId>,
    listed_namespaces: Vec<NamespaceId>,
    pub(crate) xrefs: XrefIndex,
}

macro_rules! arena_index {
    ($($id:ty => $entity:ty, $field:ident;)*) => {
        $(
            impl std::ops::Index<$id> for Database {
                type Output = $entity;

                fn index(&self, id: $id) -> &$entity {
                    &self.$field[id.index()]
                }
            }
        )*
    };
}

arena_index! {
    LanguageId => Language, languages;
    NamespaceId => Namespace, namespaces;
    TypeId => Type, types;
    RelationId => Relation, relations;
    ColumnId => Column, columns;
    SequenceId => Sequence, sequences;
    FunctionId => Function, functions;
    OperatorId => Operator, operators;
    OperatorClassId => OperatorClass, opclasses;
    ConstraintId => Constraint, constraints;
    TriggerId => Trigger, triggers;
    RuleId => Rule, rules;
}

impl Database {
    /// Source identifier (connection string).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Display label derived from the source.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// User-defined languages, in load order.
    pub fn languages(&self) -> &[LanguageId] {
        &self.listed_languages
    }

    /// Non-system namespaces, in load order.
    pub fn namespaces(&self) -> &[NamespaceId] {
        &self.listed_namespaces
    }

    /// Relation owning a column.
    pub fn column_owner(&self, id: ColumnId) -> RelationId {
        self.column_owner[id.index()]
    }

    /// Table or domain owning a constraint.
    pub fn constraint_owner(&self, id: ConstraintId) -> ConstraintOwner {
        self.constraint_owner[id.index()]
    }

    /// Table owning a trigger.
    pub fn trigger_owner(&self, id: TriggerId) -> RelationId {
        self.trigger_owner[id.index()]
    }

    /// Relation owning a rule.
    pub fn rule_owner(&self, id: RuleId) -> RelationId {
        self.rule_owner[id.index()]
    }

    /// Concrete kind of an object.
    pub fn kind_of(&self, id: ObjectId) -> ObjectKind {
        match id {
            ObjectId::Language(_) => ObjectKind::Language,
            ObjectId::Namespace(_) => ObjectKind::Namespace,
            ObjectId::Type(id) => self[id].kind(),
            ObjectId::Relation(id) => self[id].kind.object_kind(),
            ObjectId::Column(_) => ObjectKind::Column,
            ObjectId::Sequence(_) => ObjectKind::Sequence,
            ObjectId::Function(_) => ObjectKind::Function,
            ObjectId::Operator(_) => ObjectKind::Operator,
            ObjectId::OperatorClass(_) => ObjectKind::OperatorClass,
            ObjectId::Constraint(id) => self[id].kind.object_kind(),
            ObjectId::Trigger(_) => ObjectKind::Trigger,
            ObjectId::Rule(_) => ObjectKind::Rule,
        }
    }

    /// Name under which an object is matched inside its collection.
    ///
    /// Functions and operators use their signature, operator classes
    /// `name (method)`.
    pub fn collection_name(&self, id: ObjectId) -> &str {
        match id {
            ObjectId::Language(id) => &self[id].name,
            ObjectId::Namespace(id) => &self[id].name,
            ObjectId::Type(id) => &self[id].name,
            ObjectId::Relation(id) => &self[id].name,
            ObjectId::Column(id) => &self[id].name,
            ObjectId::Sequence(id) => &self[id].name,
            ObjectId::Function(id) => self[id].signature(),
            ObjectId::Operator(id) => self[id].signature(),
            ObjectId::OperatorClass(id) => self[id].label(),
            ObjectId::Constraint(id) => &self[id].name,
            ObjectId::Trigger(id) => &self[id].name,
            ObjectId::Rule(id) => &self[id].name,
        }
    }

    /// Containing object, if any.
    pub fn owner(&self, id: ObjectId) -> Option<ObjectId> {
        match id {
            ObjectId::Language(_) | ObjectId::Namespace(_) => None,
            ObjectId::Type(id) => Some(ObjectId::Namespace(self[id].namespace)),
            ObjectId::Relation(id) => Some(ObjectId::Namespace(self[id].namespace)),
            ObjectId::Sequence(id) => Some(ObjectId::Namespace(self[id].namespace)),
            ObjectId::Function(id) => Some(ObjectId::Namespace(self[id].namespace)),
            ObjectId::Operator(id) => Some(ObjectId::Namespace(self[id].namespace)),
            ObjectId::OperatorClass(id) => Some(ObjectId::Namespace(self[id].namespace)),
            ObjectId::Column(id) => Some(ObjectId::Relation(self.column_owner(id))),
            ObjectId::Constraint(id) => Some(match self.constraint_owner(id) {
                ConstraintOwner::Relation(rel) => ObjectId::Relation(rel),
                ConstraintOwner::Domain(ty) => ObjectId::Type(ty),
            }),
            ObjectId::Trigger(id) => Some(ObjectId::Relation(self.trigger_owner(id))),
            ObjectId::Rule(id) => Some(ObjectId::Relation(self.rule_owner(id))),
        }
    }

    /// Dotted path of collection names from the outermost container.
    pub fn qualified_name(&self, id: ObjectId) -> String {
        match self.owner(id) {
            Some(owner) => format!("{}.{}", self.qualified_name(owner), self.collection_name(id)),
            None => self.collection_name(id).to_string(),
        }
    }

    /// Look up a namespaced object by kind and name.
    ///
    /// Functions and operators match either their signature or their bare
    /// name; the first match in load order wins.
    pub fn find(&self, kind: ObjectKind, namespace: &str, name: &str) -> Option<ObjectId> {
        let ns = self.namespaces.iter().find(|ns| ns.name == namespace)?;
        let candidates: Vec<ObjectId> = match kind {
            ObjectKind::Type | ObjectKind::Domain => {
                ns.types.iter().copied().map(ObjectId::Type).collect()
            }
            ObjectKind::Composite | ObjectKind::Index | ObjectKind::Table | ObjectKind::View => {
                ns.relations().map(ObjectId::Relation).collect()
            }
            ObjectKind::Sequence => ns.sequences.iter().copied().map(ObjectId::Sequence).collect(),
            ObjectKind::Function => ns.functions.iter().copied().map(ObjectId::Function).collect(),
            ObjectKind::Operator => ns.operators.iter().copied().map(ObjectId::Operator).collect(),
            ObjectKind::OperatorClass => ns
                .opclasses
                .iter()
                .copied()
                .map(ObjectId::OperatorClass)
                .collect(),
            _ => return None,
        };
        candidates.into_iter().find(|&id| {
            self.kind_of(id) == kind
                && (self.collection_name(id) == name || self.bare_name(id) == name)
        })
    }

    fn bare_name(&self, id: ObjectId) -> &str {
        match id {
            ObjectId::Function(id) => &self[id].name,
            ObjectId::Operator(id) => &self[id].name,
            ObjectId::OperatorClass(id) => &self[id].name,
            _ => self.collection_name(id),
        }
    }
}

/// Derive a display label from a connection string.
///
/// Uses the `dbname=` token of a keyword/value string or the path of a URL,
/// falling back to the whole source.
pub fn source_label(source: &str) -> String {
    if let Some(token) = source
        .split_whitespace()
        .find_map(|part| part.strip_prefix("dbname="))
    {
        if !token.is_empty() {
            return token.to_string();
        }
    }
    if let Some((_, rest)) = source.split_once("://") {
        let path = rest.split(['?', '#']).next().unwrap_or_default();
        if let Some((_, name)) = path.split_once('/') {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    source.to_string()
}

/// Incremental builder for a [`Database`].
///
/// Objects are added in dependency order. Back-references are recorded as
/// objects are added; name and ownership rules are checked by
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct DatabaseBuilder {
    db: Database,
}

impl DatabaseBuilder {
    /// Start a snapshot for a source.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let label = source_label(&source);
        Self {
            db: Database {
                source,
                label,
                languages: Vec::new(),
                namespaces: Vec::new(),
                types: Vec::new(),
                relations: Vec::new(),
                columns: Vec::new(),
                sequences: Vec::new(),
                functions: Vec::new(),
                operators: Vec::new(),
                opclasses: Vec::new(),
                constraints: Vec::new(),
                triggers: Vec::new(),
                rules: Vec::new(),
                column_owner: Vec::new(),
                constraint_owner: Vec::new(),
                trigger_owner: Vec::new(),
                rule_owner: Vec::new(),
                listed_languages: Vec::new(),
                listed_namespaces: Vec::new(),
                xrefs: XrefIndex::default(),
            },
        }
    }

    /// Override the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.db.label = label.into();
        self
    }

    /// Read access to the snapshot under construction.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Add a language; only user-defined languages are listed.
    pub fn add_language(&mut self, language: Language, user_defined: bool) -> LanguageId {
        let id = LanguageId::from_index(self.db.languages.len());
        self.db.languages.push(language);
        if user_defined {
            self.db.listed_languages.push(id);
        }
        id
    }

    /// Add a namespace; system namespaces are kept unlisted.
    pub fn add_namespace(&mut self, namespace: Namespace) -> NamespaceId {
        let id = NamespaceId::from_index(self.db.namespaces.len());
        if !namespace.name.starts_with(SYSTEM_NAMESPACE_PREFIX) {
            self.db.listed_namespaces.push(id);
        }
        self.db.namespaces.push(namespace);
        id
    }

    /// Add a type and list it in its namespace.
    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = self.add_internal_type(ty);
        let ns = self.db.types[id.index()].namespace;
        self.db.namespaces[ns.index()].types.push(id);
        id
    }

    /// Add a type that is resolvable but not listed (pseudo, row and
    /// array-of-row types).
    pub fn add_internal_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId::from_index(self.db.types.len());
        if let Some(base) = ty.domain.as_ref().and_then(|d| d.base_type) {
            self.db.xrefs.record(ObjectId::Type(id), ObjectId::Type(base));
        }
        self.db.types.push(ty);
        id
    }

    /// Bind the base type of a domain. Ignored for base types.
    pub fn set_base_type(&mut self, domain: TypeId, base: TypeId) {
        if let Some(info) = self.db.types[domain.index()].domain.as_mut() {
            info.base_type = Some(base);
            self.db.xrefs.record(ObjectId::Type(domain), ObjectId::Type(base));
        }
    }

    /// Add a relation and list it in its namespace by kind.
    pub fn add_relation(&mut self, relation: Relation) -> RelationId {
        let id = RelationId::from_index(self.db.relations.len());
        let ns = &mut self.db.namespaces[relation.namespace.index()];
        match relation.kind {
            RelationKind::Composite => ns.composites.push(id),
            RelationKind::Index => ns.indexes.push(id),
            RelationKind::Table => ns.tables.push(id),
            RelationKind::View => ns.views.push(id),
        }
        self.db.relations.push(relation);
        id
    }

    /// Add a column to a relation.
    ///
    /// A position collision keeps the first column in the relation's map and
    /// is reported by [`finish`](Self::finish).
    pub fn add_column(&mut self, relation: RelationId, column: Column) -> ColumnId {
        let id = ColumnId::from_index(self.db.columns.len());
        self.db
            .xrefs
            .record(ObjectId::Column(id), ObjectId::Type(column.data_type));
        self.db.relations[relation.index()]
            .columns
            .entry(column.position)
            .or_insert(id);
        self.db.columns.push(column);
        self.db.column_owner.push(relation);
        id
    }

    /// Column of a relation at an attribute number.
    pub fn column_at(&self, relation: RelationId, position: i16) -> Option<ColumnId> {
        self.db.relations[relation.index()]
            .columns
            .get(&position)
            .copied()
    }

    /// Add a sequence and list it in its namespace.
    pub fn add_sequence(&mut self, sequence: Sequence) -> SequenceId {
        let id = SequenceId::from_index(self.db.sequences.len());
        self.db.namespaces[sequence.namespace.index()].sequences.push(id);
        self.db.sequences.push(sequence);
        id
    }

    /// Attach a constraint to a relation.
    pub fn add_table_constraint(
        &mut self,
        relation: RelationId,
        constraint: Constraint,
    ) -> ConstraintId {
        let id = ConstraintId::from_index(self.db.constraints.len());
        let this = ObjectId::Constraint(id);
        for &column in constraint.kind.columns() {
            self.db.xrefs.record(this, ObjectId::Column(column));
        }
        if let ConstraintKind::ForeignKey {
            foreign_table,
            foreign_columns,
            ..
        } = &constraint.kind
        {
            self.db.xrefs.record(this, ObjectId::Relation(*foreign_table));
            for &column in foreign_columns {
                self.db.xrefs.record(this, ObjectId::Column(column));
            }
        }
        self.db.relations[relation.index()].constraints.push(id);
        self.db.constraints.push(constraint);
        self.db.constraint_owner.push(ConstraintOwner::Relation(relation));
        id
    }

    /// Attach a constraint to a domain.
    pub fn add_domain_constraint(
        &mut self,
        domain: TypeId,
        constraint: Constraint,
    ) -> ConstraintId {
        let id = ConstraintId::from_index(self.db.constraints.len());
        if let Some(info) = self.db.types[domain.index()].domain.as_mut() {
            info.constraints.push(id);
        }
        self.db.constraints.push(constraint);
        self.db.constraint_owner.push(ConstraintOwner::Domain(domain));
        id
    }

    /// Type name as written in a signature; qualified outside `pg_catalog`.
    fn signature_type(&self, ty: TypeId) -> String {
        let ty = &self.db.types[ty.index()];
        let namespace = &self.db.namespaces[ty.namespace.index()].name;
        if namespace == BUILTIN_NAMESPACE {
            ty.name.clone()
        } else {
            format!("{}.{}", namespace, ty.name)
        }
    }

    /// Add a function and list it in its namespace.
    ///
    /// The signature is computed from the input argument types.
    pub fn add_function(&mut self, mut function: Function) -> FunctionId {
        let id = FunctionId::from_index(self.db.functions.len());
        let this = ObjectId::Function(id);
        let args: Vec<String> = function
            .arg_types
            .iter()
            .map(|&ty| self.signature_type(ty))
            .collect();
        function.signature = format!("{}({})", function.name, args.join(", "));

        self.db.xrefs.record(this, ObjectId::Language(function.language));
        self.db.xrefs.record(this, ObjectId::Type(function.return_type));
        for &ty in &function.arg_types {
            self.db.xrefs.record(this, ObjectId::Type(ty));
        }
        self.db.namespaces[function.namespace.index()].functions.push(id);
        self.db.functions.push(function);
        id
    }

    /// Attach a trigger to a table.
    pub fn add_trigger(&mut self, relation: RelationId, trigger: Trigger) -> TriggerId {
        let id = TriggerId::from_index(self.db.triggers.len());
        self.db
            .xrefs
            .record(ObjectId::Trigger(id), ObjectId::Function(trigger.function));
        self.db.relations[relation.index()].triggers.push(id);
        self.db.triggers.push(trigger);
        self.db.trigger_owner.push(relation);
        id
    }

    /// Attach a rewrite rule to a relation.
    pub fn add_rule(&mut self, relation: RelationId, rule: Rule) -> RuleId {
        let id = RuleId::from_index(self.db.rules.len());
        self.db.relations[relation.index()].rules.push(id);
        self.db.rules.push(rule);
        self.db.rule_owner.push(relation);
        id
    }

    /// Add an operator and list it in its namespace.
    pub fn add_operator(&mut self, mut operator: Operator) -> OperatorId {
        let id = OperatorId::from_index(self.db.operators.len());
        let this = ObjectId::Operator(id);
        let side = |ty: Option<TypeId>| {
            ty.map_or_else(|| "NONE".to_string(), |ty| self.signature_type(ty))
        };
        operator.signature = format!(
            "{}({}, {})",
            operator.name,
            side(operator.left),
            side(operator.right)
        );
        for ty in [operator.left, operator.right, operator.result].into_iter().flatten() {
            self.db.xrefs.record(this, ObjectId::Type(ty));
        }
        self.db.namespaces[operator.namespace.index()].operators.push(id);
        self.db.operators.push(operator);
        id
    }

    /// Add an operator class and list it in its namespace.
    pub fn add_operator_class(&mut self, mut opclass: OperatorClass) -> OperatorClassId {
        let id = OperatorClassId::from_index(self.db.opclasses.len());
        let this = ObjectId::OperatorClass(id);
        opclass.label = format!("{} ({})", opclass.name, opclass.method);
        self.db.xrefs.record(this, ObjectId::Type(opclass.input_type));
        if let Some(key_type) = opclass.key_type {
            self.db.xrefs.record(this, ObjectId::Type(key_type));
        }
        self.db.namespaces[opclass.namespace.index()].opclasses.push(id);
        self.db.opclasses.push(opclass);
        id
    }

    /// Validate and freeze the snapshot.
    pub fn finish(self) -> Result<Database> {
        let db = self.db;
        db.validate_namespaces()?;
        db.validate_domains()?;
        db.validate_relations()?;
        tracing::debug!(
            source = %db.label,
            namespaces = db.listed_namespaces.len(),
            relations = db.relations.len(),
            functions = db.functions.len(),
            "catalog snapshot built"
        );
        Ok(db)
    }
}

fn unique_names<'a>(
    group: &'static str,
    container: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CatalogError::DuplicateName {
                group,
                name: name.to_string(),
                container: container.to_string(),
            });
        }
    }
    Ok(())
}

impl Database {
    fn validate_namespaces(&self) -> Result<()> {
        for ns in &self.namespaces {
            let container = ns.name.as_str();
            unique_names("type", container, ns.types.iter().map(|&id| self[id].name.as_str()))?;
            unique_names(
                "relation",
                container,
                ns.relations().map(|id| self[id].name.as_str()),
            )?;
            unique_names(
                "sequence",
                container,
                ns.sequences.iter().map(|&id| self[id].name.as_str()),
            )?;
            unique_names(
                "function",
                container,
                ns.functions.iter().map(|&id| self[id].signature()),
            )?;
            unique_names(
                "operator",
                container,
                ns.operators.iter().map(|&id| self[id].signature()),
            )?;
            unique_names(
                "operator class",
                container,
                ns.opclasses.iter().map(|&id| self[id].label()),
            )?;
        }
        Ok(())
    }

    fn validate_domains(&self) -> Result<()> {
        for (index, ty) in self.types.iter().enumerate() {
            let Some(info) = &ty.domain else { continue };
            let name = self.qualified_name(ObjectId::Type(TypeId::from_index(index)));
            if info.base_type.is_none() {
                return Err(CatalogError::MissingBaseType(name));
            }
            for &id in &info.constraints {
                let constraint = &self[id];
                if constraint.kind.is_column_constraint() {
                    return Err(CatalogError::MisplacedChild {
                        child: "constraint",
                        name: constraint.name.clone(),
                        relation: name,
                        kind: ObjectKind::Domain.as_str(),
                    });
                }
            }
            unique_names(
                "constraint",
                &name,
                info.constraints.iter().map(|&id| self[id].name.as_str()),
            )?;
        }
        Ok(())
    }

    fn validate_relations(&self) -> Result<()> {
        let mut positions: BTreeMap<RelationId, BTreeSet<i16>> = BTreeMap::new();
        for (index, column) in self.columns.iter().enumerate() {
            let owner = self.column_owner[index];
            if !positions.entry(owner).or_default().insert(column.position) {
                return Err(CatalogError::DuplicatePosition {
                    relation: self.qualified_name(ObjectId::Relation(owner)),
                    position: column.position,
                });
            }
        }

        for (index, relation) in self.relations.iter().enumerate() {
            let id = RelationId::from_index(index);
            let name = self.qualified_name(ObjectId::Relation(id));
            let kind = relation.kind.object_kind().as_str();
            let misplaced = |child: &'static str, child_name: &str| CatalogError::MisplacedChild {
                child,
                name: child_name.to_string(),
                relation: name.clone(),
                kind,
            };

            if relation.kind != RelationKind::Table {
                if let Some(&c) = relation.constraints.first() {
                    return Err(misplaced("constraint", &self[c].name));
                }
                if let Some(&t) = relation.triggers.first() {
                    return Err(misplaced("trigger", &self[t].name));
                }
            }
            if !relation.kind.has_rules() {
                if let Some(&r) = relation.rules.first() {
                    return Err(misplaced("rule", &self[r].name));
                }
            }

            for &c in &relation.constraints {
                let constraint = &self[c];
                if !constraint.kind.is_column_constraint() {
                    return Err(misplaced("constraint", &constraint.name));
                }
                let foreign_ok = match &constraint.kind {
                    ConstraintKind::ForeignKey {
                        foreign_table,
                        foreign_columns,
                        ..
                    } => foreign_columns
                        .iter()
                        .all(|&col| self.column_owner(col) == *foreign_table),
                    _ => true,
                };
                let local_ok = constraint
                    .kind
                    .columns()
                    .iter()
                    .all(|&col| self.column_owner(col) == id);
                if !local_ok || !foreign_ok {
                    return Err(CatalogError::ForeignColumn {
                        constraint: constraint.name.clone(),
                        relation: name.clone(),
                    });
                }
            }

            unique_names(
                "column",
                &name,
                relation.columns.values().map(|&c| self[c].name.as_str()),
            )?;
            unique_names(
                "constraint",
                &name,
                relation.constraints.iter().map(|&c| self[c].name.as_str()),
            )?;
            unique_names(
                "trigger",
                &name,
                relation.triggers.iter().map(|&t| self[t].name.as_str()),
            )?;
            unique_names(
                "rule",
                &name,
                relation.rules.iter().map(|&r| self[r].name.as_str()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> (DatabaseBuilder, NamespaceId, TypeId) {
        let mut builder = DatabaseBuilder::new("dbname=app host=localhost");
        let catalog = builder.add_namespace(Namespace::new("pg_catalog", "postgres"));
        let int4 = builder.add_type(Type::new(catalog, "int4", "postgres"));
        let public = builder.add_namespace(Namespace::new("public", "postgres"));
        (builder, public, int4)
    }

    #[test]
    fn test_source_label() {
        assert_eq!(source_label("host=db dbname=shop user=x"), "shop");
        assert_eq!(source_label("postgres://u@h:5432/orders?sslmode=off"), "orders");
        assert_eq!(source_label("service=prod"), "service=prod");
    }

    #[test]
    fn test_system_namespaces_are_unlisted() {
        let (builder, public, _) = base();
        let db = builder.finish().unwrap();
        assert_eq!(db.namespaces(), &[public]);
        assert_eq!(db.label(), "app");
    }

    #[test]
    fn test_function_signature_and_xrefs() {
        let (mut builder, public, int4) = base();
        let sql = builder.add_language(Language::new("sql", "postgres"), false);
        let f = builder.add_function(
            Function::new(public, "add", "app", sql, int4).with_arg_types([int4, int4]),
        );
        let db = builder.finish().unwrap();

        assert_eq!(db[f].signature(), "add(int4, int4)");
        assert_eq!(db.collection_name(ObjectId::Function(f)), "add(int4, int4)");
        assert!(db.languages().is_empty());
        assert!(db
            .referrers(ObjectId::Type(int4))
            .contains(&ObjectId::Function(f)));
    }

    #[test]
    fn test_operator_signature_uses_none() {
        let (mut builder, public, int4) = base();
        let op = builder.add_operator(
            Operator::new(public, "-", "app")
                .with_operands(None, Some(int4))
                .with_result(int4),
        );
        let db = builder.finish().unwrap();
        assert_eq!(db[op].signature(), "-(NONE, int4)");
    }

    #[test]
    fn test_overloads_on_same_named_types() {
        let (mut builder, _, int4) = base();
        let s1 = builder.add_namespace(Namespace::new("s1", "app"));
        let s2 = builder.add_namespace(Namespace::new("s2", "app"));
        let money1 = builder.add_type(Type::new(s1, "money2", "app"));
        let money2 = builder.add_type(Type::new(s2, "money2", "app"));
        let sql = builder.add_language(Language::new("sql", "postgres"), false);
        let f1 = builder.add_function(
            Function::new(s1, "f", "app", sql, int4).with_arg_types([money1]),
        );
        let f2 = builder.add_function(
            Function::new(s1, "f", "app", sql, int4).with_arg_types([money2, int4]),
        );
        let f3 = builder.add_function(
            Function::new(s1, "f", "app", sql, int4).with_arg_types([money2]),
        );
        let db = builder.finish().unwrap();

        assert_eq!(db[f1].signature(), "f(s1.money2)");
        assert_eq!(db[f2].signature(), "f(s2.money2, int4)");
        assert_eq!(db[f3].signature(), "f(s2.money2)");
        assert_eq!(
            db.find(ObjectKind::Function, "s1", "f(s2.money2)"),
            Some(ObjectId::Function(f3))
        );
    }

    #[test]
    fn test_operators_on_same_named_types() {
        let (mut builder, public, int4) = base();
        let s1 = builder.add_namespace(Namespace::new("s1", "app"));
        let s2 = builder.add_namespace(Namespace::new("s2", "app"));
        let left = builder.add_type(Type::new(s1, "point2", "app"));
        let right = builder.add_type(Type::new(s2, "point2", "app"));
        let a = builder.add_operator(
            Operator::new(public, "<->", "app")
                .with_operands(Some(left), Some(left))
                .with_result(int4),
        );
        let b = builder.add_operator(
            Operator::new(public, "<->", "app")
                .with_operands(Some(right), Some(right))
                .with_result(int4),
        );
        let db = builder.finish().unwrap();

        assert_eq!(db[a].signature(), "<->(s1.point2, s1.point2)");
        assert_eq!(db[b].signature(), "<->(s2.point2, s2.point2)");
    }

    #[test]
    fn test_qualified_column_name() {
        let (mut builder, public, int4) = base();
        let t = builder.add_relation(Relation::table(public, "users", "app"));
        let c = builder.add_column(t, Column::new(1, "id", int4));
        let db = builder.finish().unwrap();
        assert_eq!(db.qualified_name(ObjectId::Column(c)), "public.users.id");
        assert_eq!(db.kind_of(ObjectId::Relation(t)), ObjectKind::Table);
    }

    #[test]
    fn test_duplicate_relation_name_across_kinds() {
        let (mut builder, public, _) = base();
        builder.add_relation(Relation::table(public, "users", "app"));
        builder.add_relation(Relation::view(public, "users", "app"));
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName { group: "relation", .. }));
    }

    #[test]
    fn test_duplicate_column_position() {
        let (mut builder, public, int4) = base();
        let t = builder.add_relation(Relation::table(public, "users", "app"));
        builder.add_column(t, Column::new(1, "id", int4));
        builder.add_column(t, Column::new(1, "other", int4));
        let err = builder.finish().unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicatePosition {
                relation: "public.users".into(),
                position: 1
            }
        );
    }

    #[test]
    fn test_domain_requires_base_type() {
        let (mut builder, public, _) = base();
        builder.add_type(Type::domain(public, "email", "app"));
        let err = builder.finish().unwrap_err();
        assert_eq!(err, CatalogError::MissingBaseType("public.email".into()));
    }

    #[test]
    fn test_trigger_on_view_is_rejected() {
        let (mut builder, public, int4) = base();
        let plpgsql = builder.add_language(Language::new("plpgsql", "postgres"), true);
        let f = builder.add_function(Function::new(public, "audit", "app", plpgsql, int4));
        let v = builder.add_relation(Relation::view(public, "v", "app"));
        builder.add_trigger(v, Trigger::new("t", f, "CREATE TRIGGER t"));
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, CatalogError::MisplacedChild { child: "trigger", .. }));
    }

    #[test]
    fn test_constraint_with_foreign_column() {
        let (mut builder, public, int4) = base();
        let a = builder.add_relation(Relation::table(public, "a", "app"));
        let b = builder.add_relation(Relation::table(public, "b", "app"));
        let b_id = builder.add_column(b, Column::new(1, "id", int4));
        builder.add_table_constraint(
            a,
            Constraint::primary_key("a_pkey", "PRIMARY KEY (id)", [b_id]),
        );
        let err = builder.finish().unwrap_err();
        assert!(matches!(err, CatalogError::ForeignColumn { .. }));
    }

    #[test]
    fn test_find_function_by_bare_name() {
        let (mut builder, public, int4) = base();
        let sql = builder.add_language(Language::new("sql", "postgres"), false);
        let f = builder.add_function(
            Function::new(public, "inc", "app", sql, int4).with_arg_types([int4]),
        );
        let db = builder.finish().unwrap();
        assert_eq!(
            db.find(ObjectKind::Function, "public", "inc"),
            Some(ObjectId::Function(f))
        );
        assert_eq!(
            db.find(ObjectKind::Function, "public", "inc(int4)"),
            Some(ObjectId::Function(f))
        );
        assert_eq!(db.find(ObjectKind::Table, "public", "inc"), None);
    }
}
