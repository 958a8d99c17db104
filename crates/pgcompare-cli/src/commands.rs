//! Subcommand execution.

use crate::config::{Command, KindArg};
use crate::error::{CliError, Result};
use crate::formatter::Formatter;
use pgcompare_core::{diff_databases, Database, ObjectKind};
use pgcompare_loader::{load_database, load_databases, LoadConfig};
use serde::Serialize;

/// One object in a dependents listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependent {
    pub kind: ObjectKind,
    /// Dotted qualified name.
    pub name: String,
}

/// Rendered output of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub output: String,
    /// Whether the sources disagree.
    pub differences: bool,
}

/// Load the sources a command names and render its report.
pub async fn execute(
    command: &Command,
    config: &LoadConfig,
    formatter: &dyn Formatter,
) -> Result<Report> {
    match command {
        Command::Diff { sources } => {
            let databases = load_databases(sources, config).await?;
            diff_report(&databases, formatter)
        }
        Command::Missing { sources } => {
            let databases = load_databases(sources, config).await?;
            missing_report(&databases, formatter)
        }
        Command::Dependents {
            object,
            kind,
            source,
        } => {
            let database = load_database(source, config).await?;
            dependents_report(&database, *kind, object, formatter)
        }
    }
}

/// Render the difference tree of loaded snapshots.
pub fn diff_report(databases: &[Database], formatter: &dyn Formatter) -> Result<Report> {
    let diff = diff_databases(databases);
    let differences = !diff.is_empty();
    tracing::info!(
        sources = databases.len(),
        differences,
        "comparison finished"
    );
    Ok(Report {
        output: formatter.format_diff(&diff)?,
        differences,
    })
}

/// Render the objects missing from some of the loaded snapshots.
pub fn missing_report(databases: &[Database], formatter: &dyn Formatter) -> Result<Report> {
    let diff = diff_databases(databases);
    let missing = diff.missing();
    tracing::info!(
        sources = databases.len(),
        missing = missing.len(),
        "comparison finished"
    );
    Ok(Report {
        output: formatter.format_missing(&diff.sources, &missing)?,
        differences: !missing.is_empty(),
    })
}

/// Render the dependents of `object` (`namespace.name`) in drop order.
pub fn dependents_report(
    database: &Database,
    kind: KindArg,
    object: &str,
    formatter: &dyn Formatter,
) -> Result<Report> {
    let kind = ObjectKind::from(kind);
    let (namespace, name) = object
        .split_once('.')
        .ok_or_else(|| CliError::InvalidObject(object.to_string()))?;
    let id = database
        .find(kind, namespace, name)
        .ok_or_else(|| CliError::ObjectNotFound {
            kind,
            object: object.to_string(),
        })?;

    let dependents: Vec<Dependent> = database
        .drop_order(id)
        .into_iter()
        .map(|id| Dependent {
            kind: database.kind_of(id),
            name: database.qualified_name(id),
        })
        .collect();
    tracing::debug!(
        object,
        dependents = dependents.len().saturating_sub(1),
        "dependents resolved"
    );

    Ok(Report {
        output: formatter.format_dependents(&dependents)?,
        differences: false,
    })
}
