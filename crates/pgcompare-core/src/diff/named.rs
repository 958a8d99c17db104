//! Named collections: union-by-name matching.

use super::group::{serialize_groups, Grouped};
use super::tree::ObjectDiff;
use super::DiffContext;
use crate::catalog::{FlatKey, ObjectId, ObjectKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Objects of one name across all sources.
#[derive(Debug, Clone, Serialize)]
pub struct NamedEntry {
    /// Collection name.
    pub name: String,
    /// Kind of the first present object.
    pub kind: ObjectKind,
    /// Per-source object with this name.
    #[serde(skip)]
    pub objects: Vec<Option<ObjectId>>,
    /// Structural grouping; absent sources have no group.
    #[serde(serialize_with = "serialize_groups")]
    pub presence: Grouped<FlatKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ObjectDiff>,
}

/// Interesting entries of a named collection, sorted by name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NamedList {
    pub entries: Vec<NamedEntry>,
}

impl NamedList {
    /// Match per-source collections by collection name.
    ///
    /// `collections[s]` is `None` where the owner is absent from source `s`.
    /// Returns `None` when no entry is interesting.
    pub(crate) fn build(
        ctx: &DiffContext<'_>,
        collections: &[Option<Vec<ObjectId>>],
    ) -> Option<Self> {
        let sources = collections.len();
        let owners = collections.iter().filter(|c| c.is_some()).count();

        let mut by_name: BTreeMap<&str, Vec<Option<ObjectId>>> = BTreeMap::new();
        for ((source, collection), db) in collections.iter().enumerate().zip(ctx.databases()) {
            for &id in collection.as_deref().unwrap_or_default() {
                let slots = by_name
                    .entry(db.collection_name(id))
                    .or_insert_with(|| vec![None; sources]);
                slots[source] = Some(id);
            }
        }

        let entries: Vec<NamedEntry> = by_name
            .into_iter()
            .filter_map(|(name, objects)| {
                let presence = ctx.presence(&objects, owners);
                let diff = ctx.diff_entry(&objects);
                if !presence.is_partial() && diff.is_none() {
                    return None;
                }
                let kind = ctx.first_kind(&objects)?;
                Some(NamedEntry {
                    name: name.to_string(),
                    kind,
                    objects,
                    presence,
                    diff,
                })
            })
            .collect();

        (!entries.is_empty()).then_some(Self { entries })
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&NamedEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Entries present in some sources but not all.
    pub fn partial(&self) -> impl Iterator<Item = &NamedEntry> {
        self.entries.iter().filter(|e| e.presence.is_partial())
    }
}
