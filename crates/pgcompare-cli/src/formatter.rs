//! Output formatters for diff reports.

use crate::commands::Dependent;
use crate::error::Result;
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use pgcompare_core::diff::{AlignOp, Field, MissingObject, OrderedList, ValueView};
use pgcompare_core::{DatabaseDiff, NamedList};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented tree and ASCII tables
    Text,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting reports.
pub trait Formatter: Send + Sync {
    /// Format a full difference tree.
    fn format_diff(&self, diff: &DatabaseDiff) -> Result<String>;

    /// Format the objects missing from some sources.
    fn format_missing(&self, sources: &[String], missing: &[MissingObject]) -> Result<String>;

    /// Format dependents of an object in drop order.
    fn format_dependents(&self, dependents: &[Dependent]) -> Result<String>;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Plain-text formatter: an indented tree for diffs, comfy-table for lists.
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_diff(&self, diff: &DatabaseDiff) -> Result<String> {
        if diff.is_empty() {
            return Ok(format!(
                "No differences across {} source(s)",
                diff.sources.len()
            ));
        }

        let mut tree = TreeWriter::new(&diff.sources);
        for (i, source) in diff.sources.iter().enumerate() {
            tree.line(0, format!("[{}] {}", i, source));
        }
        for list in [&diff.languages, &diff.namespaces].into_iter().flatten() {
            tree.named(list, 0);
        }
        Ok(tree.finish())
    }

    fn format_missing(&self, sources: &[String], missing: &[MissingObject]) -> Result<String> {
        if missing.is_empty() {
            return Ok("No missing objects".to_string());
        }

        let mut table = Table::new();
        let mut header = vec![Cell::new("object"), Cell::new("kind")];
        header.extend(sources.iter().map(Cell::new));
        table.set_header(header);

        for object in missing {
            let mut row = vec![Cell::new(&object.path), Cell::new(object.kind)];
            row.extend(
                object
                    .present
                    .iter()
                    .map(|&present| Cell::new(if present { "yes" } else { "-" })),
            );
            table.add_row(row);
        }

        Ok(format!("{}\n{} object(s)", table, missing.len()))
    }

    fn format_dependents(&self, dependents: &[Dependent]) -> Result<String> {
        let mut table = Table::new();
        table.set_header(vec!["#", "kind", "object"]);
        for (i, dependent) in dependents.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(dependent.kind),
                Cell::new(&dependent.name),
            ]);
        }
        Ok(table.to_string())
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_diff(&self, diff: &DatabaseDiff) -> Result<String> {
        Ok(serde_json::to_string_pretty(diff)?)
    }

    fn format_missing(&self, sources: &[String], missing: &[MissingObject]) -> Result<String> {
        let report = serde_json::json!({
            "sources": sources,
            "missing": missing,
        });
        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn format_dependents(&self, dependents: &[Dependent]) -> Result<String> {
        Ok(serde_json::to_string_pretty(dependents)?)
    }
}

/// Line-oriented renderer of a diff tree.
struct TreeWriter<'a> {
    sources: &'a [String],
    lines: Vec<String>,
}

impl<'a> TreeWriter<'a> {
    fn new(sources: &'a [String]) -> Self {
        Self {
            sources,
            lines: Vec::new(),
        }
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }

    fn line(&mut self, depth: usize, text: impl std::fmt::Display) {
        self.lines.push(format!("{}{}", "  ".repeat(depth), text));
    }

    fn labels(&self, members: impl IntoIterator<Item = usize>) -> String {
        members
            .into_iter()
            .map(|i| self.sources[i].as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn present_in(&mut self, depth: usize, present: &[bool]) {
        let members = present
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p)
            .map(|(i, _)| i);
        let labels = self.labels(members);
        self.line(depth, format!("present in: {}", labels));
    }

    fn named(&mut self, list: &NamedList, depth: usize) {
        for entry in &list.entries {
            self.line(depth, format!("{} {}", entry.kind, entry.name));
            if entry.presence.is_partial() {
                self.present_in(depth + 1, &entry.presence.presence());
            }
            if let Some(diff) = &entry.diff {
                self.fields(diff.fields(), depth + 1);
            }
        }
    }

    fn ordered(&mut self, list: &OrderedList, depth: usize) {
        for row in &list.rows {
            if row.op == AlignOp::Equal && row.diff.is_none() {
                continue;
            }
            let marker = match row.op {
                AlignOp::Equal => ' ',
                AlignOp::Inserted => '+',
                AlignOp::Deleted => '-',
            };
            self.line(depth, format!("{} {}", marker, row.name));
            if row.op != AlignOp::Equal {
                self.present_in(depth + 2, &row.presence.presence());
            }
            if let Some(diff) = &row.diff {
                self.fields(diff.fields(), depth + 2);
            }
        }
    }

    fn values(&mut self, view: &ValueView<'_>, depth: usize) {
        let count = view.groups.iter().flatten().max().map_or(0, |&g| g + 1);
        for group in 0..count {
            let members: Vec<usize> = view
                .groups
                .iter()
                .enumerate()
                .filter(|&(_, &g)| g == Some(group))
                .map(|(i, _)| i)
                .collect();
            let value = members
                .first()
                .and_then(|&i| view.values[i].as_deref())
                .unwrap_or_default();
            let labels = self.labels(members);
            self.line(depth, format!("{}  [{}]", value, labels));
        }
    }

    fn fields(&mut self, fields: Vec<(&'static str, Field<'_>)>, depth: usize) {
        for (name, field) in fields {
            match field {
                Field::Value(view) => {
                    self.line(depth, format!("{}:", name));
                    self.values(&view, depth + 1);
                }
                Field::Named(list) => {
                    self.line(depth, format!("{}:", name));
                    self.named(list, depth + 1);
                }
                Field::Ordered(list) => {
                    let title = format!("{} (order of {}):", name, self.sources[list.baseline]);
                    self.line(depth, title);
                    self.ordered(list, depth + 1);
                }
            }
        }
    }
}
