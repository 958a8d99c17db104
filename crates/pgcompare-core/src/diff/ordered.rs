//! Ordered collections: name-keyed sequence alignment.

use super::group::{serialize_groups, Grouped};
use super::tree::ObjectDiff;
use super::DiffContext;
use crate::catalog::{FlatKey, ObjectId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// Alignment operation over a run of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignOp {
    /// Same names on both sides.
    Equal,
    /// Names only on the right side.
    Inserted,
    /// Names only on the left side.
    Deleted,
}

/// A maximal run of one [`AlignOp`].
///
/// `a` and `b` index the two input sequences; the range of the side an
/// operation does not consume is empty and marks the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub op: AlignOp,
    pub a: Range<usize>,
    pub b: Range<usize>,
}

/// Align two sequences by longest common subsequence.
///
/// Equal heads are always matched. Otherwise a deletion from `a` is taken
/// before an insertion from `b` when both keep the LCS length, so the
/// result is deterministic and its equal runs cover a maximum common
/// subsequence.
pub fn align<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Opcode> {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![0usize; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let mut opcodes: Vec<Opcode> = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        let op = if i < n && j < m && a[i] == b[j] {
            AlignOp::Equal
        } else if i < n && (j == m || lcs[(i + 1) * width + j] >= lcs[i * width + j + 1]) {
            AlignOp::Deleted
        } else {
            AlignOp::Inserted
        };
        let (di, dj) = match op {
            AlignOp::Equal => (1, 1),
            AlignOp::Deleted => (1, 0),
            AlignOp::Inserted => (0, 1),
        };
        match opcodes.last_mut() {
            Some(last) if last.op == op => {
                last.a.end += di;
                last.b.end += dj;
            }
            _ => opcodes.push(Opcode {
                op,
                a: i..i + di,
                b: j..j + dj,
            }),
        }
        i += di;
        j += dj;
    }
    opcodes
}

/// One aligned position across all sources.
#[derive(Debug, Clone, Serialize)]
pub struct OrderedRow {
    /// Name shared by every object on the row.
    pub name: String,
    /// Classification relative to the baseline source.
    pub op: AlignOp,
    /// Per-source object on this row.
    #[serde(skip)]
    pub objects: Vec<Option<ObjectId>>,
    /// Structural grouping of the row's objects.
    #[serde(serialize_with = "serialize_groups")]
    pub presence: Grouped<FlatKey>,
    /// Content diff of the row's objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ObjectDiff>,
}

/// N-way alignment of an ordered collection.
#[derive(Debug, Clone, Serialize)]
pub struct OrderedList {
    /// Source whose order the rows follow.
    pub baseline: usize,
    /// Whether rows are owned children rather than references.
    #[serde(skip)]
    pub owned: bool,
    /// Per-source presence of the owning object.
    #[serde(skip)]
    pub owners: Vec<bool>,
    pub rows: Vec<OrderedRow>,
}

struct PendingRow {
    name: String,
    objects: Vec<Option<ObjectId>>,
}

impl PendingRow {
    fn new(name: &str, sources: usize) -> Self {
        Self {
            name: name.to_string(),
            objects: vec![None; sources],
        }
    }
}

impl OrderedList {
    /// Align per-source sequences against the lowest-index present source.
    ///
    /// `sequences[s]` is `None` where the owner is absent from source `s`.
    /// Owned rows present in two or more sources are diffed recursively.
    /// Returns `None` when every row is equal and unchanged.
    pub(crate) fn build(
        ctx: &DiffContext<'_>,
        sequences: &[Option<Vec<ObjectId>>],
        owned: bool,
    ) -> Option<Self> {
        let baseline = sequences.iter().position(Option::is_some)?;
        let sources = sequences.len();
        let names: Vec<Vec<&str>> = sequences
            .iter()
            .zip(ctx.databases())
            .map(|(seq, db)| {
                seq.as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|&id| db.collection_name(id))
                    .collect()
            })
            .collect();
        let base = sequences[baseline].as_deref().unwrap_or_default();

        let mut base_rows: Vec<PendingRow> = base
            .iter()
            .zip(&names[baseline])
            .map(|(&id, name)| {
                let mut row = PendingRow::new(name, sources);
                row.objects[baseline] = Some(id);
                row
            })
            .collect();
        let mut inserted: BTreeMap<usize, Vec<PendingRow>> = BTreeMap::new();

        for (source, seq) in sequences.iter().enumerate().skip(baseline + 1) {
            let Some(seq) = seq else { continue };
            for opcode in align(&names[baseline], &names[source]) {
                match opcode.op {
                    AlignOp::Equal => {
                        for (row, &id) in base_rows[opcode.a].iter_mut().zip(&seq[opcode.b]) {
                            row.objects[source] = Some(id);
                        }
                    }
                    AlignOp::Inserted => {
                        let rows = inserted.entry(opcode.a.start).or_default();
                        for index in opcode.b {
                            let name = names[source][index];
                            let slot = rows
                                .iter()
                                .position(|r| r.name == name && r.objects[source].is_none());
                            let slot = match slot {
                                Some(slot) => slot,
                                None => {
                                    rows.push(PendingRow::new(name, sources));
                                    rows.len() - 1
                                }
                            };
                            rows[slot].objects[source] = Some(seq[index]);
                        }
                    }
                    AlignOp::Deleted => {}
                }
            }
        }

        let mut pending = Vec::with_capacity(base_rows.len());
        let mut base_rows = base_rows.into_iter();
        for anchor in 0..=base.len() {
            if let Some(rows) = inserted.remove(&anchor) {
                pending.extend(rows.into_iter().map(|r| (r, false)));
            }
            if let Some(row) = base_rows.next() {
                pending.push((row, true));
            }
        }

        let owners = sequences.iter().filter(|s| s.is_some()).count();
        let rows: Vec<OrderedRow> = pending
            .into_iter()
            .map(|(row, in_baseline)| {
                let present = row.objects.iter().filter(|o| o.is_some()).count();
                let op = match (in_baseline, present == owners) {
                    (true, true) => AlignOp::Equal,
                    (true, false) => AlignOp::Deleted,
                    (false, _) => AlignOp::Inserted,
                };
                let presence = ctx.presence(&row.objects, owners);
                let diff = if owned && present >= 2 {
                    ctx.diff_entry(&row.objects)
                } else {
                    None
                };
                OrderedRow {
                    name: row.name,
                    op,
                    objects: row.objects,
                    presence,
                    diff,
                }
            })
            .collect();

        let interesting = rows
            .iter()
            .any(|row| row.op != AlignOp::Equal || row.diff.is_some());
        interesting.then_some(Self {
            baseline,
            owned,
            owners: sequences.iter().map(Option::is_some).collect(),
            rows,
        })
    }

    /// Names absent from some source that has the owner, in row order.
    ///
    /// A name moved between positions spans a deleted and an inserted row,
    /// so presence is merged across every row carrying the name.
    pub fn partial_names(&self) -> Vec<(&str, Vec<bool>)> {
        let mut names: Vec<(&str, Vec<bool>)> = Vec::new();
        for row in &self.rows {
            let slot = match names.iter().position(|(name, _)| *name == row.name) {
                Some(slot) => slot,
                None => {
                    names.push((row.name.as_str(), vec![false; row.objects.len()]));
                    names.len() - 1
                }
            };
            for (present, object) in names[slot].1.iter_mut().zip(&row.objects) {
                *present |= object.is_some();
            }
        }
        names.retain(|(_, present)| {
            present
                .iter()
                .zip(&self.owners)
                .any(|(&present, &owner)| owner && !present)
        });
        names
    }

    /// Rows that are not aligned in every source.
    pub fn changed_rows(&self) -> impl Iterator<Item = &OrderedRow> {
        self.rows.iter().filter(|row| row.op != AlignOp::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(a: &[&str], b: &[&str]) -> Vec<(AlignOp, Range<usize>, Range<usize>)> {
        align(a, b)
            .into_iter()
            .map(|o| (o.op, o.a, o.b))
            .collect()
    }

    #[test]
    fn test_identical_sequences_are_one_equal_run() {
        assert_eq!(
            ops(&["a", "b", "c"], &["a", "b", "c"]),
            vec![(AlignOp::Equal, 0..3, 0..3)]
        );
    }

    #[test]
    fn test_deleted_middle() {
        assert_eq!(
            ops(&["a", "b", "c"], &["a", "c"]),
            vec![
                (AlignOp::Equal, 0..1, 0..1),
                (AlignOp::Deleted, 1..2, 1..1),
                (AlignOp::Equal, 2..3, 1..2),
            ]
        );
    }

    #[test]
    fn test_appended() {
        assert_eq!(
            ops(&["id", "name"], &["id", "name", "age"]),
            vec![
                (AlignOp::Equal, 0..2, 0..2),
                (AlignOp::Inserted, 2..2, 2..3),
            ]
        );
    }

    #[test]
    fn test_delete_before_insert_on_replacement() {
        assert_eq!(
            ops(&["a", "x", "c"], &["a", "y", "c"]),
            vec![
                (AlignOp::Equal, 0..1, 0..1),
                (AlignOp::Deleted, 1..2, 1..1),
                (AlignOp::Inserted, 2..2, 1..2),
                (AlignOp::Equal, 2..3, 2..3),
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(align::<&str>(&[], &[]).is_empty());
        assert_eq!(ops(&[], &["a"]), vec![(AlignOp::Inserted, 0..0, 0..1)]);
        assert_eq!(ops(&["a"], &[]), vec![(AlignOp::Deleted, 0..1, 0..0)]);
    }

    #[test]
    fn test_swap_keeps_one_equal() {
        let result = align(&["a", "b"], &["b", "a"]);
        let equal: usize = result
            .iter()
            .filter(|o| o.op == AlignOp::Equal)
            .map(|o| o.a.len())
            .sum();
        assert_eq!(equal, 1);
    }
}
