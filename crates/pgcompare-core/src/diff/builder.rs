//! Recursive diff tree construction.

use super::group::Grouped;
use super::named::NamedList;
use super::ordered::OrderedList;
use super::tree::*;
use super::DiffContext;
use crate::catalog::{
    ColumnId, ConstraintId, ConstraintKind, Database, FlatKey, FunctionId, LanguageId,
    NamespaceId, ObjectId, ObjectKind, OperatorClassId, OperatorId, RelationId, RuleId,
    SequenceId, TriggerId, TypeId,
};

/// Compare snapshots and build the pruned diff tree.
pub fn diff_databases(databases: &[Database]) -> DatabaseDiff {
    let ctx = DiffContext::new(databases);
    let languages: Vec<_> = databases
        .iter()
        .map(|db| Some(db.languages().iter().copied().map(ObjectId::Language).collect()))
        .collect();
    let namespaces: Vec<_> = databases
        .iter()
        .map(|db| Some(db.namespaces().iter().copied().map(ObjectId::Namespace).collect()))
        .collect();

    let diff = DatabaseDiff {
        sources: databases.iter().map(|db| db.label().to_string()).collect(),
        languages: NamedList::build(&ctx, &languages),
        namespaces: NamedList::build(&ctx, &namespaces),
    };
    tracing::debug!(
        sources = databases.len(),
        namespaces = diff.namespaces.as_ref().map_or(0, |l| l.entries.len()),
        "diff complete"
    );
    diff
}

/// Diff per-source objects of one kind.
///
/// `objects[s]` is the object in source `s`, if any. Returns `None` when the
/// present objects do not differ.
pub fn diff_object(
    ctx: &DiffContext<'_>,
    kind: ObjectKind,
    objects: &[Option<ObjectId>],
) -> Option<ObjectDiff> {
    let s = Sides { ctx, objects };
    match kind {
        ObjectKind::Language => {
            let ids = s.ids(language_id);
            let d = LanguageDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
            };
            (!d.is_empty()).then_some(ObjectDiff::Language(d))
        }
        ObjectKind::Namespace => {
            let ids = s.ids(namespace_id);
            let d = NamespaceDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                types: s.named(&ids, |db, id| {
                    db[id].types.iter().copied().map(ObjectId::Type).collect()
                }),
                relations: s.named(&ids, |db, id| {
                    db[id].relations().map(ObjectId::Relation).collect()
                }),
                sequences: s.named(&ids, |db, id| {
                    db[id].sequences.iter().copied().map(ObjectId::Sequence).collect()
                }),
                functions: s.named(&ids, |db, id| {
                    db[id].functions.iter().copied().map(ObjectId::Function).collect()
                }),
                operators: s.named(&ids, |db, id| {
                    db[id].operators.iter().copied().map(ObjectId::Operator).collect()
                }),
                opclasses: s.named(&ids, |db, id| {
                    db[id]
                        .opclasses
                        .iter()
                        .copied()
                        .map(ObjectId::OperatorClass)
                        .collect()
                }),
            };
            (!d.is_empty()).then_some(ObjectDiff::Namespace(d))
        }
        ObjectKind::Type => {
            let ids = s.ids(type_id);
            let d = TypeDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                notnull: s.attr(&ids, |db, id| db[id].notnull),
                default: s.attr(&ids, |db, id| db[id].default.clone()),
            };
            (!d.is_empty()).then_some(ObjectDiff::Type(d))
        }
        ObjectKind::Domain => {
            let ids = s.ids(type_id);
            let d = DomainDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                notnull: s.attr(&ids, |db, id| db[id].notnull),
                default: s.attr(&ids, |db, id| db[id].default.clone()),
                base_type: s.attr(&ids, |db, id| {
                    let base = db[id].domain.as_ref().and_then(|d| d.base_type);
                    type_key(db, base)
                }),
                constraints: s.named(&ids, |db, id| {
                    db[id]
                        .domain
                        .iter()
                        .flat_map(|d| d.constraints.iter().copied())
                        .map(ObjectId::Constraint)
                        .collect()
                }),
            };
            (!d.is_empty()).then_some(ObjectDiff::Domain(d))
        }
        ObjectKind::Function => {
            let ids = s.ids(function_id);
            let d = FunctionDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                language: s.attr(&ids, |db, id| {
                    db.identity_key(ObjectId::Language(db[id].language)).clone()
                }),
                return_type: s.attr(&ids, |db, id| type_key(db, Some(db[id].return_type))),
                arg_types: s.attr(&ids, |db, id| {
                    key_list(db, db[id].arg_types.iter().copied().map(ObjectId::Type))
                }),
                source: s.attr(&ids, |db, id| db[id].source.clone()),
                binary: s.attr(&ids, |db, id| db[id].binary.clone()),
            };
            (!d.is_empty()).then_some(ObjectDiff::Function(d))
        }
        ObjectKind::Composite | ObjectKind::Index => {
            let ids = s.ids(relation_id);
            let d = RelationDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                columns: s.columns(&ids),
            };
            (!d.is_empty()).then(|| match kind {
                ObjectKind::Index => ObjectDiff::Index(d),
                _ => ObjectDiff::Composite(d),
            })
        }
        ObjectKind::View => {
            let ids = s.ids(relation_id);
            let d = ViewDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                columns: s.columns(&ids),
                rules: s.named(&ids, |db, id| {
                    db[id].rules.iter().copied().map(ObjectId::Rule).collect()
                }),
            };
            (!d.is_empty()).then_some(ObjectDiff::View(d))
        }
        ObjectKind::Table => {
            let ids = s.ids(relation_id);
            let d = TableDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                columns: s.columns(&ids),
                rules: s.named(&ids, |db, id| {
                    db[id].rules.iter().copied().map(ObjectId::Rule).collect()
                }),
                triggers: s.named(&ids, |db, id| {
                    db[id].triggers.iter().copied().map(ObjectId::Trigger).collect()
                }),
                constraints: s.named(&ids, |db, id| {
                    db[id]
                        .constraints
                        .iter()
                        .copied()
                        .map(ObjectId::Constraint)
                        .collect()
                }),
            };
            (!d.is_empty()).then_some(ObjectDiff::Table(d))
        }
        ObjectKind::Sequence => {
            let ids = s.ids(sequence_id);
            let d = SequenceDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                increment: s.attr(&ids, |db, id| db[id].increment),
                minimum: s.attr(&ids, |db, id| db[id].minimum),
                maximum: s.attr(&ids, |db, id| db[id].maximum),
            };
            (!d.is_empty()).then_some(ObjectDiff::Sequence(d))
        }
        ObjectKind::Column => {
            let ids = s.ids(column_id);
            let d = ColumnDiff {
                data_type: s.attr(&ids, |db, id| type_key(db, Some(db[id].data_type))),
                notnull: s.attr(&ids, |db, id| db[id].notnull),
                default: s.attr(&ids, |db, id| db[id].default.clone()),
            };
            (!d.is_empty()).then_some(ObjectDiff::Column(d))
        }
        ObjectKind::CheckConstraint | ObjectKind::UniqueConstraint => {
            let ids = s.ids(constraint_id);
            let d = ConstraintDiff {
                definition: s.attr(&ids, |db, id| db[id].definition.clone()),
            };
            (!d.is_empty()).then(|| match kind {
                ObjectKind::UniqueConstraint => ObjectDiff::UniqueConstraint(d),
                _ => ObjectDiff::CheckConstraint(d),
            })
        }
        ObjectKind::CheckColumnConstraint
        | ObjectKind::UniqueColumnConstraint
        | ObjectKind::PrimaryKey => {
            let ids = s.ids(constraint_id);
            let d = ColumnConstraintDiff {
                definition: s.attr(&ids, |db, id| db[id].definition.clone()),
                columns: s.column_refs(&ids, |kind| kind.columns()),
            };
            (!d.is_empty()).then(|| match kind {
                ObjectKind::UniqueColumnConstraint => ObjectDiff::UniqueColumnConstraint(d),
                ObjectKind::PrimaryKey => ObjectDiff::PrimaryKey(d),
                _ => ObjectDiff::CheckColumnConstraint(d),
            })
        }
        ObjectKind::ForeignKey => {
            let ids = s.ids(constraint_id);
            let d = ForeignKeyDiff {
                definition: s.attr(&ids, |db, id| db[id].definition.clone()),
                columns: s.column_refs(&ids, |kind| kind.columns()),
                foreign_table: s.attr(&ids, |db, id| match &db[id].kind {
                    ConstraintKind::ForeignKey { foreign_table, .. } => {
                        db.identity_key(ObjectId::Relation(*foreign_table)).clone()
                    }
                    _ => FlatKey::Null,
                }),
                foreign_columns: s.column_refs(&ids, |kind| match kind {
                    ConstraintKind::ForeignKey {
                        foreign_columns, ..
                    } => foreign_columns.as_slice(),
                    _ => &[],
                }),
            };
            (!d.is_empty()).then_some(ObjectDiff::ForeignKey(d))
        }
        ObjectKind::Trigger => {
            let ids = s.ids(trigger_id);
            let d = TriggerDiff {
                function: s.attr(&ids, |db, id| {
                    db.identity_key(ObjectId::Function(db[id].function)).clone()
                }),
                definition: s.attr(&ids, |db, id| db[id].definition.clone()),
            };
            (!d.is_empty()).then_some(ObjectDiff::Trigger(d))
        }
        ObjectKind::Rule => {
            let ids = s.ids(rule_id);
            let d = RuleDiff {
                definition: s.attr(&ids, |db, id| db[id].definition.clone()),
            };
            (!d.is_empty()).then_some(ObjectDiff::Rule(d))
        }
        ObjectKind::Operator => {
            let ids = s.ids(operator_id);
            let d = OperatorDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                left: s.attr(&ids, |db, id| type_key(db, db[id].left)),
                right: s.attr(&ids, |db, id| type_key(db, db[id].right)),
                result: s.attr(&ids, |db, id| type_key(db, db[id].result)),
            };
            (!d.is_empty()).then_some(ObjectDiff::Operator(d))
        }
        ObjectKind::OperatorClass => {
            let ids = s.ids(opclass_id);
            let d = OperatorClassDiff {
                owner: s.attr(&ids, |db, id| db[id].owner.clone()),
                input_type: s.attr(&ids, |db, id| type_key(db, Some(db[id].input_type))),
                default: s.attr(&ids, |db, id| db[id].default),
                key_type: s.attr(&ids, |db, id| type_key(db, db[id].key_type)),
            };
            (!d.is_empty()).then_some(ObjectDiff::OperatorClass(d))
        }
    }
}

fn type_key(db: &Database, id: Option<TypeId>) -> FlatKey {
    id.map_or(FlatKey::Null, |id| db.identity_key(ObjectId::Type(id)).clone())
}

fn key_list(db: &Database, ids: impl Iterator<Item = ObjectId>) -> FlatKey {
    FlatKey::List(ids.map(|id| db.identity_key(id).clone()).collect())
}

macro_rules! pick {
    ($($fn:ident => $variant:ident($id:ty);)*) => {
        $(
            fn $fn(id: ObjectId) -> Option<$id> {
                match id {
                    ObjectId::$variant(id) => Some(id),
                    _ => None,
                }
            }
        )*
    };
}

pick! {
    language_id => Language(LanguageId);
    namespace_id => Namespace(NamespaceId);
    type_id => Type(TypeId);
    relation_id => Relation(RelationId);
    column_id => Column(ColumnId);
    sequence_id => Sequence(SequenceId);
    function_id => Function(FunctionId);
    operator_id => Operator(OperatorId);
    opclass_id => OperatorClass(OperatorClassId);
    constraint_id => Constraint(ConstraintId);
    trigger_id => Trigger(TriggerId);
    rule_id => Rule(RuleId);
}

/// Per-source objects of one node.
struct Sides<'c, 'a> {
    ctx: &'c DiffContext<'a>,
    objects: &'c [Option<ObjectId>],
}

impl<'c, 'a> Sides<'c, 'a> {
    fn ids<I>(&self, pick: fn(ObjectId) -> Option<I>) -> Vec<Option<I>> {
        self.objects.iter().map(|o| o.and_then(pick)).collect()
    }

    fn expected<I>(ids: &[Option<I>]) -> usize {
        ids.iter().filter(|id| id.is_some()).count()
    }

    /// Group an attribute over the sources where the object exists.
    fn attr<I, T, F>(&self, ids: &[Option<I>], value: F) -> Option<Grouped<T>>
    where
        I: Copy,
        T: PartialEq,
        F: Fn(&'a Database, I) -> T,
    {
        let values = ids
            .iter()
            .zip(self.ctx.databases())
            .map(|(id, db)| id.map(|id| value(db, id)))
            .collect();
        Grouped::with_expected(values, Self::expected(ids)).into_difference()
    }

    fn children<I, F>(&self, ids: &[Option<I>], children: F) -> Vec<Option<Vec<ObjectId>>>
    where
        I: Copy,
        F: Fn(&'a Database, I) -> Vec<ObjectId>,
    {
        ids.iter()
            .zip(self.ctx.databases())
            .map(|(id, db)| id.map(|id| children(db, id)))
            .collect()
    }

    fn named<I, F>(&self, ids: &[Option<I>], children: F) -> Option<NamedList>
    where
        I: Copy,
        F: Fn(&'a Database, I) -> Vec<ObjectId>,
    {
        NamedList::build(self.ctx, &self.children(ids, children))
    }

    fn columns(&self, ids: &[Option<RelationId>]) -> Option<OrderedList> {
        let sequences = self.children(ids, |db, id| {
            db[id].ordered_columns().map(ObjectId::Column).collect()
        });
        OrderedList::build(self.ctx, &sequences, true)
    }

    fn column_refs<F>(&self, ids: &[Option<ConstraintId>], columns: F) -> Option<OrderedList>
    where
        F: Fn(&ConstraintKind) -> &[ColumnId],
    {
        let sequences = self.children(ids, |db, id| {
            columns(&db[id].kind)
                .iter()
                .copied()
                .map(ObjectId::Column)
                .collect()
        });
        OrderedList::build(self.ctx, &sequences, false)
    }
}
