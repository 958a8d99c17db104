//! Equivalence grouping of per-source values.

use crate::catalog::{FlatKey, ObjectKind};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Per-source values partitioned into equivalence groups.
///
/// Groups are numbered in first-seen order: group 0 holds the value of the
/// earliest source that has one. Sources without a value have no group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouped<T> {
    values: Vec<Option<T>>,
    groups: Vec<Option<usize>>,
    #[serde(skip)]
    group_count: usize,
    #[serde(skip)]
    expected: usize,
}

impl<T: PartialEq> Grouped<T> {
    /// Group values where every source is expected to have one.
    pub fn new(values: Vec<Option<T>>) -> Self {
        let expected = values.len();
        Self::with_expected(values, expected)
    }

    /// Group values where only `expected` sources can have one.
    pub fn with_expected(values: Vec<Option<T>>, expected: usize) -> Self {
        let mut representatives: Vec<usize> = Vec::new();
        let mut groups = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let Some(value) = value else {
                groups.push(None);
                continue;
            };
            let existing = representatives
                .iter()
                .position(|&rep| values[rep].as_ref() == Some(value));
            let group = existing.unwrap_or_else(|| {
                representatives.push(index);
                representatives.len() - 1
            });
            groups.push(Some(group));
        }
        Self {
            values,
            groups,
            group_count: representatives.len(),
            expected,
        }
    }
}

impl<T> Grouped<T> {
    /// Per-source values.
    pub fn values(&self) -> &[Option<T>] {
        &self.values
    }

    /// Per-source group index.
    pub fn groups(&self) -> &[Option<usize>] {
        &self.groups
    }

    /// Number of distinct groups.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Number of sources that have a value.
    pub fn present_count(&self) -> usize {
        self.groups.iter().filter(|g| g.is_some()).count()
    }

    /// Whether some but not all expected sources have a value.
    pub fn is_partial(&self) -> bool {
        let present = self.present_count();
        present > 0 && present < self.expected
    }

    /// Whether the sources disagree.
    pub fn is_difference(&self) -> bool {
        self.group_count >= 2 || self.is_partial()
    }

    /// Keep only genuine differences.
    pub fn into_difference(self) -> Option<Self> {
        self.is_difference().then_some(self)
    }

    /// Sources belonging to a group.
    pub fn members(&self, group: usize) -> impl Iterator<Item = usize> + '_ {
        self.groups
            .iter()
            .enumerate()
            .filter(move |(_, g)| **g == Some(group))
            .map(|(index, _)| index)
    }

    /// Group indices ordered by descending size, ties by group number.
    ///
    /// Renderers use this to give the majority the first colour.
    pub fn groups_by_size(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.group_count];
        for group in self.groups.iter().flatten() {
            sizes[*group] += 1;
        }
        let mut order: Vec<usize> = (0..self.group_count).collect();
        order.sort_by_key(|&g| std::cmp::Reverse(sizes[g]));
        order
    }

    /// Per-source presence flags.
    pub fn presence(&self) -> Vec<bool> {
        self.groups.iter().map(Option::is_some).collect()
    }
}

/// Serialize only the group column of a grouping.
pub(crate) fn serialize_groups<T, S>(grouped: &Grouped<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(grouped.groups.len()))?;
    for group in &grouped.groups {
        seq.serialize_element(group)?;
    }
    seq.end()
}

/// Text form of a grouped value for renderers.
pub trait RenderValue {
    /// Render a present value.
    fn render(&self) -> String;
}

impl RenderValue for String {
    fn render(&self) -> String {
        self.clone()
    }
}

impl RenderValue for bool {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl RenderValue for i64 {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl RenderValue for FlatKey {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl RenderValue for ObjectKind {
    fn render(&self) -> String {
        self.as_str().to_string()
    }
}

impl<T: RenderValue> RenderValue for Option<T> {
    fn render(&self) -> String {
        self.as_ref().map_or_else(|| "NULL".to_string(), RenderValue::render)
    }
}

/// Rendered values of a grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueView<'a> {
    /// Per-source text, `None` where the source has no value.
    pub values: Vec<Option<String>>,
    /// Per-source group index.
    pub groups: &'a [Option<usize>],
}

impl<T: RenderValue> Grouped<T> {
    /// Render every value.
    pub fn view(&self) -> ValueView<'_> {
        ValueView {
            values: self
                .values
                .iter()
                .map(|v| v.as_ref().map(RenderValue::render))
                .collect(),
            groups: &self.groups,
        }
    }
}
