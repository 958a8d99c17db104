//! N-way diff engine.
//!
//! Compares any number of [`Database`] snapshots and produces a pruned
//! [`DatabaseDiff`] tree. The engine is synchronous and never mutates its
//! inputs.

mod builder;
mod group;
mod named;
mod ordered;
mod tree;

pub use builder::{diff_databases, diff_object};
pub use group::{Grouped, RenderValue, ValueView};
pub use named::{NamedEntry, NamedList};
pub use ordered::{align, AlignOp, Opcode, OrderedList, OrderedRow};
pub use tree::{
    AsField, ColumnConstraintDiff, ColumnDiff, ConstraintDiff, DatabaseDiff, DomainDiff, Field,
    ForeignKeyDiff, FunctionDiff, LanguageDiff, MissingObject, NamespaceDiff, ObjectDiff,
    OperatorClassDiff, OperatorDiff, RelationDiff, RuleDiff, SequenceDiff, TableDiff, TriggerDiff,
    TypeDiff, ViewDiff,
};

use crate::catalog::{Database, FlatKey, ObjectId, ObjectKind};

/// The snapshots being compared, in source order.
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    databases: &'a [Database],
}

impl<'a> DiffContext<'a> {
    pub fn new(databases: &'a [Database]) -> Self {
        Self { databases }
    }

    /// Snapshots in source order.
    pub fn databases(&self) -> &'a [Database] {
        self.databases
    }

    /// Number of sources.
    pub fn sources(&self) -> usize {
        self.databases.len()
    }

    fn present<'b>(
        &self,
        objects: &'b [Option<ObjectId>],
    ) -> impl Iterator<Item = (&'a Database, ObjectId)> + 'b
    where
        'a: 'b,
    {
        objects
            .iter()
            .zip(self.databases)
            .filter_map(|(id, db)| id.map(|id| (db, id)))
    }

    /// Group objects by structural key.
    pub(crate) fn presence(&self, objects: &[Option<ObjectId>], owners: usize) -> Grouped<FlatKey> {
        let keys = objects
            .iter()
            .zip(self.databases)
            .map(|(id, db)| id.map(|id| db.flat_key(id).clone()))
            .collect();
        Grouped::with_expected(keys, owners)
    }

    pub(crate) fn first_kind(&self, objects: &[Option<ObjectId>]) -> Option<ObjectKind> {
        self.present(objects).next().map(|(db, id)| db.kind_of(id))
    }

    /// Diff objects matched under one name.
    ///
    /// Kinds that disagree produce [`ObjectDiff::KindMismatch`]. Fewer than
    /// two present objects, or leaf objects with equal structural keys,
    /// produce no diff.
    pub(crate) fn diff_entry(&self, objects: &[Option<ObjectId>]) -> Option<ObjectDiff> {
        let kinds: Vec<Option<ObjectKind>> = objects
            .iter()
            .zip(self.databases)
            .map(|(id, db)| id.map(|id| db.kind_of(id)))
            .collect();
        let present = kinds.iter().filter(|k| k.is_some()).count();
        let kinds = Grouped::with_expected(kinds, present);
        if kinds.group_count() > 1 {
            return Some(ObjectDiff::KindMismatch(kinds));
        }
        if present < 2 {
            return None;
        }
        let kind = self.first_kind(objects)?;
        if kind.is_leaf() {
            let mut keys = self.present(objects).map(|(db, id)| db.flat_key(id));
            let first = keys.next()?;
            if keys.all(|key| key == first) {
                return None;
            }
        }
        diff_object(self, kind, objects)
    }
}
