//! Identity and structural flat keys of catalog objects.

use super::database::Database;
use super::flat::{FlatKey, KeyCache};
use super::ids::{ObjectId, TypeId};
use super::objects::ConstraintKind;

fn text(s: &str) -> FlatKey {
    FlatKey::Text(s.to_string())
}

fn opt_text(s: &Option<String>) -> FlatKey {
    FlatKey::text_or_null(s.as_deref())
}

impl Database {
    fn cache(&self, id: ObjectId) -> &KeyCache {
        match id {
            ObjectId::Language(id) => &self[id].keys,
            ObjectId::Namespace(id) => &self[id].keys,
            ObjectId::Type(id) => &self[id].keys,
            ObjectId::Relation(id) => &self[id].keys,
            ObjectId::Column(id) => &self[id].keys,
            ObjectId::Sequence(id) => &self[id].keys,
            ObjectId::Function(id) => &self[id].keys,
            ObjectId::Operator(id) => &self[id].keys,
            ObjectId::OperatorClass(id) => &self[id].keys,
            ObjectId::Constraint(id) => &self[id].keys,
            ObjectId::Trigger(id) => &self[id].keys,
            ObjectId::Rule(id) => &self[id].keys,
        }
    }

    /// Key fields only; stable across independently loaded snapshots.
    pub fn identity_key(&self, id: ObjectId) -> &FlatKey {
        self.cache(id)
            .identity
            .get_or_init(|| self.compute_identity(id))
    }

    /// Every attribute, with references replaced by their identity keys.
    pub fn flat_key(&self, id: ObjectId) -> &FlatKey {
        self.cache(id)
            .structural
            .get_or_init(|| self.compute_structural(id))
    }

    fn type_key(&self, id: TypeId) -> FlatKey {
        self.identity_key(ObjectId::Type(id)).clone()
    }

    fn opt_type_key(&self, id: Option<TypeId>) -> FlatKey {
        id.map_or(FlatKey::Null, |id| self.type_key(id))
    }

    fn list<I>(&self, ids: I) -> FlatKey
    where
        I: IntoIterator<Item = ObjectId>,
    {
        FlatKey::List(ids.into_iter().map(|id| self.identity_key(id).clone()).collect())
    }

    fn compute_identity(&self, id: ObjectId) -> FlatKey {
        let ns_key = |ns| self.identity_key(ObjectId::Namespace(ns)).clone();
        match id {
            ObjectId::Language(id) => FlatKey::name(&self[id].name),
            ObjectId::Namespace(id) => FlatKey::name(&self[id].name),
            ObjectId::Type(id) => {
                let ty = &self[id];
                FlatKey::Tuple(vec![ns_key(ty.namespace), text(&ty.name)])
            }
            ObjectId::Relation(id) => {
                let rel = &self[id];
                FlatKey::Tuple(vec![ns_key(rel.namespace), text(&rel.name)])
            }
            ObjectId::Sequence(id) => {
                let seq = &self[id];
                FlatKey::Tuple(vec![ns_key(seq.namespace), text(&seq.name)])
            }
            ObjectId::Function(id) => {
                let f = &self[id];
                FlatKey::Tuple(vec![
                    ns_key(f.namespace),
                    text(&f.name),
                    self.list(f.arg_types.iter().copied().map(ObjectId::Type)),
                ])
            }
            ObjectId::Operator(id) => {
                let op = &self[id];
                FlatKey::Tuple(vec![
                    ns_key(op.namespace),
                    text(&op.name),
                    self.opt_type_key(op.left),
                    self.opt_type_key(op.right),
                ])
            }
            ObjectId::OperatorClass(id) => {
                let opc = &self[id];
                FlatKey::Tuple(vec![ns_key(opc.namespace), text(&opc.method), text(&opc.name)])
            }
            ObjectId::Column(id) => FlatKey::name(&self[id].name),
            ObjectId::Constraint(id) => FlatKey::name(&self[id].name),
            ObjectId::Trigger(id) => FlatKey::name(&self[id].name),
            ObjectId::Rule(id) => FlatKey::name(&self[id].name),
        }
    }

    fn compute_structural(&self, id: ObjectId) -> FlatKey {
        let identity = self.identity_key(id).clone();
        let attrs = match id {
            ObjectId::Language(id) => vec![text(&self[id].owner)],
            ObjectId::Namespace(id) => {
                let ns = &self[id];
                vec![
                    text(&ns.owner),
                    self.list(ns.types.iter().copied().map(ObjectId::Type)),
                    self.list(ns.relations().map(ObjectId::Relation)),
                    self.list(ns.sequences.iter().copied().map(ObjectId::Sequence)),
                    self.list(ns.functions.iter().copied().map(ObjectId::Function)),
                    self.list(ns.operators.iter().copied().map(ObjectId::Operator)),
                    self.list(ns.opclasses.iter().copied().map(ObjectId::OperatorClass)),
                ]
            }
            ObjectId::Type(id) => {
                let ty = &self[id];
                let mut attrs = vec![
                    text(&ty.owner),
                    FlatKey::Bool(ty.notnull),
                    opt_text(&ty.default),
                ];
                if let Some(info) = &ty.domain {
                    attrs.push(self.opt_type_key(info.base_type));
                    let constraints = info.constraints.iter().copied();
                    attrs.push(self.list(constraints.map(ObjectId::Constraint)));
                }
                attrs
            }
            ObjectId::Relation(id) => {
                let rel = &self[id];
                vec![
                    text(rel.kind.object_kind().as_str()),
                    text(&rel.owner),
                    self.list(rel.ordered_columns().map(ObjectId::Column)),
                    self.list(rel.rules.iter().copied().map(ObjectId::Rule)),
                    self.list(rel.triggers.iter().copied().map(ObjectId::Trigger)),
                    self.list(rel.constraints.iter().copied().map(ObjectId::Constraint)),
                ]
            }
            ObjectId::Column(id) => {
                // Position is carried by the owning relation's column order.
                let col = &self[id];
                vec![
                    self.type_key(col.data_type),
                    FlatKey::Bool(col.notnull),
                    opt_text(&col.default),
                ]
            }
            ObjectId::Sequence(id) => {
                let seq = &self[id];
                vec![
                    text(&seq.owner),
                    FlatKey::Int(seq.increment),
                    FlatKey::Int(seq.minimum),
                    FlatKey::Int(seq.maximum),
                ]
            }
            ObjectId::Function(id) => {
                let f = &self[id];
                vec![
                    text(&f.owner),
                    self.identity_key(ObjectId::Language(f.language)).clone(),
                    self.type_key(f.return_type),
                    opt_text(&f.source),
                    opt_text(&f.binary),
                ]
            }
            ObjectId::Operator(id) => {
                let op = &self[id];
                vec![text(&op.owner), self.opt_type_key(op.result)]
            }
            ObjectId::OperatorClass(id) => {
                let opc = &self[id];
                vec![
                    text(&opc.owner),
                    self.type_key(opc.input_type),
                    FlatKey::Bool(opc.default),
                    self.opt_type_key(opc.key_type),
                ]
            }
            ObjectId::Constraint(id) => {
                let c = &self[id];
                let mut attrs = vec![text(c.kind.object_kind().as_str()), text(&c.definition)];
                if c.kind.is_column_constraint() {
                    attrs.push(self.list(c.kind.columns().iter().copied().map(ObjectId::Column)));
                }
                if let ConstraintKind::ForeignKey {
                    foreign_table,
                    foreign_columns,
                    ..
                } = &c.kind
                {
                    attrs.push(self.identity_key(ObjectId::Relation(*foreign_table)).clone());
                    attrs.push(self.list(foreign_columns.iter().copied().map(ObjectId::Column)));
                }
                attrs
            }
            ObjectId::Trigger(id) => {
                let t = &self[id];
                vec![
                    self.identity_key(ObjectId::Function(t.function)).clone(),
                    text(&t.definition),
                ]
            }
            ObjectId::Rule(id) => vec![text(&self[id].definition)],
        };
        let mut parts = Vec::with_capacity(attrs.len() + 1);
        parts.push(identity);
        parts.extend(attrs);
        FlatKey::Tuple(parts)
    }

    /// Compare two objects of possibly different snapshots by structural key.
    pub fn structurally_equal(a: (&Database, ObjectId), b: (&Database, ObjectId)) -> bool {
        a.0.kind_of(a.1) == b.0.kind_of(b.1) && a.0.flat_key(a.1) == b.0.flat_key(b.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Column, DatabaseBuilder, Namespace, Relation, Type};

    fn users(default: Option<&str>) -> (Database, ObjectId) {
        let mut builder = DatabaseBuilder::new("dbname=a");
        let catalog = builder.add_namespace(Namespace::new("pg_catalog", "postgres"));
        let int4 = builder.add_type(Type::new(catalog, "int4", "postgres"));
        let public = builder.add_namespace(Namespace::new("public", "postgres"));
        let t = builder.add_relation(Relation::table(public, "users", "app"));
        let mut id = Column::new(1, "id", int4);
        if let Some(default) = default {
            id = id.with_default(default);
        }
        let c = builder.add_column(t, id);
        (builder.finish().unwrap(), ObjectId::Column(c))
    }

    #[test]
    fn test_identity_is_name_for_children() {
        let (db, col) = users(None);
        assert_eq!(db.identity_key(col), &FlatKey::name("id"));
    }

    #[test]
    fn test_structural_equality_across_snapshots() {
        let (a, col_a) = users(None);
        let (b, col_b) = users(None);
        let (c, col_c) = users(Some("0"));

        assert!(Database::structurally_equal((&a, col_a), (&b, col_b)));
        assert!(!Database::structurally_equal((&a, col_a), (&c, col_c)));
    }

    #[test]
    fn test_reference_contributes_identity_only() {
        let (db, col) = users(None);
        let key = db.flat_key(col).to_string();
        assert!(key.contains("pg_catalog.int4"), "{}", key);
    }

    #[test]
    fn test_relation_key_lists_columns() {
        let (db, col) = users(None);
        let rel = db.owner(col).unwrap();
        match db.flat_key(rel) {
            FlatKey::Tuple(parts) => {
                assert!(parts.contains(&FlatKey::List(vec![FlatKey::name("id")])));
            }
            other => panic!("unexpected key {:?}", other),
        }
    }
}
