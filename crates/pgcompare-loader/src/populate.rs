//! Catalog rows to entity model.

use crate::error::{LoadError, Result};
use crate::queries::CatalogRows;
use pgcompare_core::catalog::{
    Column, Constraint, Database, DatabaseBuilder, Function, FunctionId, Language, LanguageId,
    Namespace, NamespaceId, Operator, OperatorClass, Relation, RelationId, RelationKind, Rule,
    Sequence, Trigger, Type, TypeId,
};
use std::collections::HashMap;

/// Oid-keyed lookup for one object kind.
struct OidMap<T> {
    kind: &'static str,
    ids: HashMap<i64, T>,
}

impl<T: Copy> OidMap<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            ids: HashMap::new(),
        }
    }

    fn insert(&mut self, oid: i64, id: T) {
        self.ids.insert(oid, id);
    }

    fn get(&self, oid: i64) -> Result<T> {
        self.ids.get(&oid).copied().ok_or(LoadError::UnresolvedOid {
            kind: self.kind,
            oid,
        })
    }

    /// Zero means "no object".
    fn get_optional(&self, oid: i64) -> Result<Option<T>> {
        if oid == 0 {
            Ok(None)
        } else {
            self.get(oid).map(Some)
        }
    }
}

fn relation_kind(relkind: &str) -> Option<RelationKind> {
    match relkind {
        "c" => Some(RelationKind::Composite),
        "i" | "I" => Some(RelationKind::Index),
        "r" | "t" | "p" | "f" => Some(RelationKind::Table),
        "v" | "m" => Some(RelationKind::View),
        _ => None,
    }
}

/// Build a snapshot from fetched catalog rows.
///
/// Objects are added in dependency order. Rows of kinds the model does not
/// cover (exclusion constraints, unknown relation kinds) are skipped.
pub fn populate(source: &str, rows: CatalogRows) -> Result<Database> {
    let mut builder = DatabaseBuilder::new(source);

    let roles: HashMap<i64, String> = rows.roles.into_iter().map(|r| (r.oid, r.name)).collect();
    let role = |oid: i64| {
        roles
            .get(&oid)
            .cloned()
            .ok_or(LoadError::UnresolvedOid { kind: "role", oid })
    };

    let mut languages: OidMap<LanguageId> = OidMap::new("language");
    for row in rows.languages {
        let id = builder.add_language(Language::new(row.name, role(row.owner)?), row.user_defined);
        languages.insert(row.oid, id);
    }

    let mut namespaces: OidMap<NamespaceId> = OidMap::new("namespace");
    for row in rows.namespaces {
        let id = builder.add_namespace(Namespace::new(row.name, role(row.owner)?));
        namespaces.insert(row.oid, id);
    }

    let mut types: OidMap<TypeId> = OidMap::new("type");
    let mut domains = Vec::new();
    for row in rows.types {
        let namespace = namespaces.get(row.namespace)?;
        let owner = role(row.owner)?;
        let mut ty = if row.kind == "d" {
            domains.push((row.oid, row.base_type));
            Type::domain(namespace, row.name, owner)
        } else {
            Type::new(namespace, row.name, owner)
        };
        ty.notnull = row.notnull;
        ty.default = row.default_value;

        let listed = matches!(row.kind.as_str(), "b" | "d" | "e") && row.element_relation == 0;
        let id = if listed {
            builder.add_type(ty)
        } else {
            builder.add_internal_type(ty)
        };
        types.insert(row.oid, id);
    }
    for (domain, base) in domains {
        builder.set_base_type(types.get(domain)?, types.get(base)?);
    }

    let mut relations: OidMap<RelationId> = OidMap::new("relation");
    for row in rows.relations {
        let Some(kind) = relation_kind(&row.kind) else {
            tracing::debug!(relation = %row.name, relkind = %row.kind, "skipping relation kind");
            continue;
        };
        let namespace = namespaces.get(row.namespace)?;
        let id = builder.add_relation(Relation::new(namespace, kind, row.name, role(row.owner)?));
        relations.insert(row.oid, id);
    }

    for row in rows.columns {
        // Columns of skipped relation kinds are skipped with them.
        let Ok(relation) = relations.get(row.relation) else {
            continue;
        };
        let mut column = Column::new(row.position, row.name, types.get(row.data_type)?);
        column.notnull = row.notnull;
        column.default = row.default_value;
        builder.add_column(relation, column);
    }

    for row in rows.sequences {
        let namespace = namespaces.get(row.namespace)?;
        builder.add_sequence(
            Sequence::new(namespace, row.name, role(row.owner)?).with_range(
                row.increment,
                row.minimum,
                row.maximum,
            ),
        );
    }

    for row in rows.constraints {
        let column_ids = |relation_oid: i64, numbers: &[i16]| -> Result<Vec<_>> {
            let relation = relations.get(relation_oid)?;
            numbers
                .iter()
                .map(|&position| {
                    builder
                        .column_at(relation, position)
                        .ok_or(LoadError::UnresolvedColumn {
                            relation: relation_oid,
                            position,
                        })
                })
                .collect()
        };

        if row.relation != 0 {
            let columns = column_ids(row.relation, row.columns.as_deref().unwrap_or_default())?;
            let constraint = match row.kind.as_str() {
                "c" => Constraint::check_columns(row.name, row.definition, columns),
                "u" => Constraint::unique_columns(row.name, row.definition, columns),
                "p" => Constraint::primary_key(row.name, row.definition, columns),
                "f" => {
                    let foreign_columns = column_ids(
                        row.foreign_relation,
                        row.foreign_columns.as_deref().unwrap_or_default(),
                    )?;
                    let foreign_table = relations.get(row.foreign_relation)?;
                    Constraint::foreign_key(
                        row.name,
                        row.definition,
                        columns,
                        foreign_table,
                        foreign_columns,
                    )
                }
                other => {
                    tracing::debug!(
                        constraint = %row.name,
                        contype = %other,
                        "skipping constraint kind"
                    );
                    continue;
                }
            };
            let relation = relations.get(row.relation)?;
            builder.add_table_constraint(relation, constraint);
        } else if row.domain != 0 {
            let constraint = match row.kind.as_str() {
                "c" => Constraint::check(row.name, row.definition),
                "u" => Constraint::unique(row.name, row.definition),
                other => {
                    tracing::debug!(
                        constraint = %row.name,
                        contype = %other,
                        "skipping domain constraint kind"
                    );
                    continue;
                }
            };
            builder.add_domain_constraint(types.get(row.domain)?, constraint);
        }
    }

    let mut functions: OidMap<FunctionId> = OidMap::new("function");
    for row in rows.functions {
        let arg_types = row
            .arg_types
            .iter()
            .map(|&oid| types.get(oid))
            .collect::<Result<Vec<_>>>()?;
        let mut function = Function::new(
            namespaces.get(row.namespace)?,
            row.name,
            role(row.owner)?,
            languages.get(row.language)?,
            types.get(row.return_type)?,
        )
        .with_arg_types(arg_types);
        function.source = row.source;
        function.binary = row.binary;
        let id = builder.add_function(function);
        functions.insert(row.oid, id);
    }

    for row in rows.triggers {
        let relation = relations.get(row.relation)?;
        if builder.database()[relation].kind != RelationKind::Table {
            tracing::debug!(trigger = %row.name, "skipping trigger on non-table relation");
            continue;
        }
        let function = functions.get(row.function)?;
        builder.add_trigger(relation, Trigger::new(row.name, function, row.definition));
    }

    for row in rows.rules {
        let relation = relations.get(row.relation)?;
        builder.add_rule(relation, Rule::new(row.name, row.definition));
    }

    for row in rows.operators {
        let namespace = namespaces.get(row.namespace)?;
        let left = types.get_optional(row.left_type)?;
        let right = types.get_optional(row.right_type)?;
        let mut operator =
            Operator::new(namespace, row.name, role(row.owner)?).with_operands(left, right);
        operator.result = types.get_optional(row.result_type)?;
        builder.add_operator(operator);
    }

    for row in rows.opclasses {
        let mut opclass = OperatorClass::new(
            namespaces.get(row.namespace)?,
            row.method,
            row.name,
            role(row.owner)?,
            types.get(row.input_type)?,
        );
        opclass.default = row.is_default;
        opclass.key_type = types.get_optional(row.key_type)?;
        builder.add_operator_class(opclass);
    }

    Ok(builder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::*;
    use pgcompare_core::catalog::{ObjectId, ObjectKind};

    fn relation(oid: i64, name: &str, kind: &str) -> RelationRow {
        RelationRow {
            oid,
            name: name.into(),
            owner: 20,
            namespace: 2200,
            kind: kind.into(),
        }
    }

    fn column(relation: i64, name: &str, data_type: i64, position: i16) -> ColumnRow {
        ColumnRow {
            relation,
            name: name.into(),
            data_type,
            position,
            notnull: false,
            default_value: None,
        }
    }

    fn rows() -> CatalogRows {
        CatalogRows {
            roles: vec![
                RoleRow { oid: 10, name: "postgres".into() },
                RoleRow { oid: 20, name: "app".into() },
            ],
            languages: vec![
                LanguageRow { oid: 12, name: "internal".into(), owner: 10, user_defined: false },
                LanguageRow { oid: 13, name: "plpgsql".into(), owner: 10, user_defined: true },
            ],
            namespaces: vec![
                NamespaceRow { oid: 11, name: "pg_catalog".into(), owner: 10 },
                NamespaceRow { oid: 2200, name: "public".into(), owner: 20 },
            ],
            types: vec![
                TypeRow {
                    oid: 23,
                    name: "int4".into(),
                    namespace: 11,
                    owner: 10,
                    kind: "b".into(),
                    notnull: false,
                    default_value: None,
                    element_relation: 0,
                    base_type: 0,
                },
                TypeRow {
                    oid: 2279,
                    name: "trigger".into(),
                    namespace: 11,
                    owner: 10,
                    kind: "p".into(),
                    notnull: false,
                    default_value: None,
                    element_relation: 0,
                    base_type: 0,
                },
                TypeRow {
                    oid: 16400,
                    name: "positive".into(),
                    namespace: 2200,
                    owner: 20,
                    kind: "d".into(),
                    notnull: true,
                    default_value: Some("1".into()),
                    element_relation: 0,
                    base_type: 23,
                },
            ],
            relations: vec![
                relation(16410, "users", "r"),
                relation(16420, "orders", "r"),
                relation(16430, "users_pkey", "i"),
            ],
            columns: vec![
                column(16410, "id", 23, 1),
                column(16420, "id", 23, 1),
                column(16420, "user_id", 16400, 2),
                column(16430, "id", 23, 1),
            ],
            sequences: vec![SequenceRow {
                name: "users_id_seq".into(),
                owner: 20,
                namespace: 2200,
                increment: 1,
                minimum: 1,
                maximum: i64::MAX,
            }],
            constraints: vec![
                ConstraintRow {
                    name: "users_pkey".into(),
                    kind: "p".into(),
                    relation: 16410,
                    domain: 0,
                    foreign_relation: 0,
                    columns: Some(vec![1]),
                    foreign_columns: None,
                    definition: "PRIMARY KEY (id)".into(),
                },
                ConstraintRow {
                    name: "orders_user_id_fkey".into(),
                    kind: "f".into(),
                    relation: 16420,
                    domain: 0,
                    foreign_relation: 16410,
                    columns: Some(vec![2]),
                    foreign_columns: Some(vec![1]),
                    definition: "FOREIGN KEY (user_id) REFERENCES users(id)".into(),
                },
                ConstraintRow {
                    name: "positive_check".into(),
                    kind: "c".into(),
                    relation: 0,
                    domain: 16400,
                    foreign_relation: 0,
                    columns: None,
                    foreign_columns: None,
                    definition: "CHECK (VALUE > 0)".into(),
                },
            ],
            functions: vec![FunctionRow {
                oid: 16500,
                name: "touch".into(),
                namespace: 2200,
                owner: 20,
                language: 13,
                return_type: 2279,
                arg_types: vec![],
                source: Some("BEGIN RETURN NEW; END".into()),
                binary: None,
            }],
            triggers: vec![TriggerRow {
                relation: 16410,
                name: "users_touch".into(),
                function: 16500,
                definition: "CREATE TRIGGER users_touch BEFORE UPDATE ON users".into(),
            }],
            rules: vec![],
            operators: vec![OperatorRow {
                oid: 16600,
                name: "+++".into(),
                namespace: 2200,
                owner: 20,
                left_type: 0,
                right_type: 23,
                result_type: 23,
            }],
            opclasses: vec![OpclassRow {
                method: "btree".into(),
                name: "int4_ops".into(),
                namespace: 11,
                owner: 10,
                input_type: 23,
                is_default: true,
                key_type: 0,
            }],
        }
    }

    #[test]
    fn test_populate_resolves_references() {
        let db = populate("dbname=shop", rows()).unwrap();
        assert_eq!(db.label(), "shop");
        assert_eq!(db.namespaces().len(), 1);
        assert_eq!(db.languages().len(), 1);

        let public = db[db.namespaces()[0]].clone();
        assert_eq!(public.name, "public");
        assert_eq!(public.tables.len(), 2);
        assert_eq!(public.indexes.len(), 1);
        assert_eq!(public.types.len(), 1);
        assert_eq!(public.sequences.len(), 1);

        let positive = public.types[0];
        assert_eq!(db[positive].kind(), ObjectKind::Domain);
        assert_eq!(db[positive].domain.as_ref().unwrap().constraints.len(), 1);

        let op = public.operators[0];
        assert_eq!(db[op].signature(), "+++(NONE, int4)");

        let touch = public.functions[0];
        assert_eq!(db.triggers_calling(touch).len(), 1);
    }

    #[test]
    fn test_foreign_key_columns() {
        let db = populate("dbname=shop", rows()).unwrap();
        let orders = db
            .find(ObjectKind::Table, "public", "orders")
            .expect("orders table");
        let ObjectId::Relation(orders) = orders else {
            panic!("not a relation");
        };
        let fk = db[orders].constraints[0];
        assert_eq!(db[fk].kind.object_kind(), ObjectKind::ForeignKey);
        assert_eq!(
            db.qualified_name(ObjectId::Constraint(fk)),
            "public.orders.orders_user_id_fkey"
        );
    }

    #[test]
    fn test_unresolved_type_oid() {
        let mut rows = rows();
        rows.columns[0].data_type = 99999;
        let err = populate("dbname=shop", rows).unwrap_err();
        assert!(matches!(err, LoadError::UnresolvedOid { kind: "type", oid: 99999 }));
    }

    #[test]
    fn test_unresolved_constraint_column() {
        let mut rows = rows();
        rows.constraints[0].columns = Some(vec![7]);
        let err = populate("dbname=shop", rows).unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnresolvedColumn { relation: 16410, position: 7 }
        ));
    }

    #[test]
    fn test_exclusion_constraints_are_skipped() {
        let mut rows = rows();
        rows.constraints[0].kind = "x".into();
        let db = populate("dbname=shop", rows).unwrap();
        let users = db.find(ObjectKind::Table, "public", "users").unwrap();
        let ObjectId::Relation(users) = users else {
            panic!("not a relation");
        };
        assert!(db[users].constraints.is_empty());
    }
}
