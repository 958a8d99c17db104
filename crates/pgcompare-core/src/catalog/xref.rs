//! Back-reference index.
//!
//! Records, for every referenced object, the objects that reference it. The
//! index confers no ownership; the diff engine never consults it.

use super::database::Database;
use super::ids::{FunctionId, ObjectId, TriggerId};
use std::collections::{BTreeMap, BTreeSet};

/// Non-owning multimap from referenced object to referrers.
#[derive(Debug, Clone, Default)]
pub struct XrefIndex {
    referrers: BTreeMap<ObjectId, BTreeSet<ObjectId>>,
}

impl XrefIndex {
    /// Record that `referrer` references `target`.
    pub fn record(&mut self, referrer: ObjectId, target: ObjectId) {
        self.referrers.entry(target).or_default().insert(referrer);
    }

    /// Direct referrers of `target`.
    pub fn get(&self, target: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.referrers
            .get(&target)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of referenced objects.
    pub fn len(&self) -> usize {
        self.referrers.len()
    }

    /// Check if nothing is referenced.
    pub fn is_empty(&self) -> bool {
        self.referrers.is_empty()
    }
}

impl Database {
    /// Objects that directly reference `id`.
    pub fn referrers(&self, id: ObjectId) -> Vec<ObjectId> {
        self.xrefs.get(id).collect()
    }

    /// Objects that transitively reference `id`, without duplicates.
    pub fn dependents(&self, id: ObjectId) -> BTreeSet<ObjectId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<ObjectId> = self.xrefs.get(id).collect();
        while let Some(next) = stack.pop() {
            if next != id && seen.insert(next) {
                stack.extend(self.xrefs.get(next));
            }
        }
        seen
    }

    /// `id` and its dependents, ordered so every object comes after all
    /// objects that reference it.
    pub fn drop_order(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut order = Vec::new();
        let mut visited = BTreeSet::new();
        self.visit_dependents(id, &mut visited, &mut order);
        order
    }

    fn visit_dependents(
        &self,
        id: ObjectId,
        visited: &mut BTreeSet<ObjectId>,
        order: &mut Vec<ObjectId>,
    ) {
        if !visited.insert(id) {
            return;
        }
        for referrer in self.xrefs.get(id) {
            self.visit_dependents(referrer, visited, order);
        }
        order.push(id);
    }

    /// Triggers whose function is `function`.
    pub fn triggers_calling(&self, function: FunctionId) -> Vec<TriggerId> {
        self.xrefs
            .get(ObjectId::Function(function))
            .filter_map(|id| match id {
                ObjectId::Trigger(trigger) => Some(trigger),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::*;

    struct Fixture {
        db: Database,
        int4: TypeId,
        func: FunctionId,
        trigger: TriggerId,
        column: ColumnId,
        pkey: ConstraintId,
    }

    fn fixture() -> Fixture {
        let mut builder = DatabaseBuilder::new("dbname=x");
        let catalog = builder.add_namespace(Namespace::new("pg_catalog", "postgres"));
        let int4 = builder.add_type(Type::new(catalog, "int4", "postgres"));
        let trigger_ty = builder.add_internal_type(Type::new(catalog, "trigger", "postgres"));
        let plpgsql = builder.add_language(Language::new("plpgsql", "postgres"), true);
        let public = builder.add_namespace(Namespace::new("public", "app"));
        let t = builder.add_relation(Relation::table(public, "t", "app"));
        let column = builder.add_column(t, Column::new(1, "id", int4).not_null());
        let pkey = builder.add_table_constraint(
            t,
            Constraint::primary_key("t_pkey", "PRIMARY KEY (id)", [column]),
        );
        let func =
            builder.add_function(Function::new(public, "touch", "app", plpgsql, trigger_ty));
        let trigger =
            builder.add_trigger(t, Trigger::new("t_touch", func, "CREATE TRIGGER t_touch"));
        Fixture {
            db: builder.finish().unwrap(),
            int4,
            func,
            trigger,
            column,
            pkey,
        }
    }

    #[test]
    fn test_triggers_calling_function() {
        let f = fixture();
        assert_eq!(f.db.triggers_calling(f.func), vec![f.trigger]);
    }

    #[test]
    fn test_dependents_are_transitive() {
        let f = fixture();
        let deps = f.db.dependents(ObjectId::Type(f.int4));
        assert!(deps.contains(&ObjectId::Column(f.column)));
        assert!(deps.contains(&ObjectId::Constraint(f.pkey)));
    }

    #[test]
    fn test_drop_order_lists_dependents_first() {
        let f = fixture();
        let order = f.db.drop_order(ObjectId::Type(f.int4));
        let pos = |id| order.iter().position(|&o| o == id).unwrap();
        assert_eq!(order.last(), Some(&ObjectId::Type(f.int4)));
        assert!(pos(ObjectId::Constraint(f.pkey)) < pos(ObjectId::Column(f.column)));
    }

    #[test]
    fn test_unreferenced_object_drops_alone() {
        let f = fixture();
        let trigger = ObjectId::Trigger(f.trigger);
        assert!(f.db.referrers(trigger).is_empty());
        assert_eq!(f.db.drop_order(trigger), vec![trigger]);
    }
}
