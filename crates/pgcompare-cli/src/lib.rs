//! pgcompare command-line client.
//!
//! Loads every source concurrently, compares the snapshots and renders the
//! result as an indented tree, tables or JSON.

pub mod commands;
pub mod config;
pub mod error;
pub mod formatter;

pub use commands::{execute, Dependent, Report};
pub use config::{Args, Command, KindArg};
pub use error::{CliError, Result};
pub use formatter::{create_formatter, Formatter, OutputFormat};
