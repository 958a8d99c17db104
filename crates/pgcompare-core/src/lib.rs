//! pgcompare core.
//!
//! Catalog entity model and N-way diff engine. This crate performs no I/O;
//! snapshots are populated by a loader and compared with
//! [`diff_databases`].

pub mod catalog;
pub mod diff;
pub mod error;

pub use catalog::{Database, DatabaseBuilder, FlatKey, ObjectId, ObjectKind};
pub use diff::{
    diff_databases, DatabaseDiff, DiffContext, Grouped, NamedList, ObjectDiff, OrderedList,
};
pub use error::{CatalogError, Result};
