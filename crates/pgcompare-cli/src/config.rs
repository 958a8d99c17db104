//! Command-line configuration.

use crate::formatter::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use pgcompare_core::ObjectKind;
use pgcompare_loader::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_STATEMENT_TIMEOUT_SECS};
use pgcompare_loader::LoadConfig;
use std::time::Duration;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "pgcompare=info";

/// Log filter used with `--verbose`.
pub const VERBOSE_LOG_FILTER: &str = "pgcompare=debug";

/// Compare PostgreSQL catalogs across any number of databases.
#[derive(Parser, Debug)]
#[command(name = "pgcompare")]
#[command(version, about = "N-way PostgreSQL catalog comparison", long_about = None)]
pub struct Args {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format.
    #[arg(long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Statement timeout in seconds. Set to 0 to disable.
    #[arg(long, default_value_t = DEFAULT_STATEMENT_TIMEOUT_SECS, global = true)]
    pub statement_timeout: u64,

    /// Connection timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, global = true)]
    pub connect_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render the difference tree of all sources.
    Diff {
        /// Connection strings or URLs, in comparison order.
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// List objects present in some sources but not others.
    Missing {
        /// Connection strings or URLs, in comparison order.
        #[arg(required = true)]
        sources: Vec<String>,
    },

    /// List the objects depending on one object, in drop order.
    Dependents {
        /// Object as `namespace.name`. Functions and operators match by
        /// bare name or full signature.
        #[arg(long)]
        object: String,

        /// Kind of the object.
        #[arg(long, value_enum, default_value = "table")]
        kind: KindArg,

        /// Connection string or URL.
        source: String,
    },
}

/// Kinds that can be looked up by name within a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Type,
    Domain,
    Function,
    Composite,
    Index,
    View,
    Table,
    Sequence,
    Operator,
    OperatorClass,
}

impl From<KindArg> for ObjectKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Type => ObjectKind::Type,
            KindArg::Domain => ObjectKind::Domain,
            KindArg::Function => ObjectKind::Function,
            KindArg::Composite => ObjectKind::Composite,
            KindArg::Index => ObjectKind::Index,
            KindArg::View => ObjectKind::View,
            KindArg::Table => ObjectKind::Table,
            KindArg::Sequence => ObjectKind::Sequence,
            KindArg::Operator => ObjectKind::Operator,
            KindArg::OperatorClass => ObjectKind::OperatorClass,
        }
    }
}

impl Args {
    /// Log filter for the subscriber when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        }
    }

    /// Convert command-line arguments to loader configuration.
    pub fn into_config(self) -> (Command, OutputFormat, LoadConfig) {
        let config = LoadConfig::new()
            .with_statement_timeout(Duration::from_secs(self.statement_timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout));
        (self.command, self.format, config)
    }
}
