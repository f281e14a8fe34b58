//! Storage layer: typed collections, the database, and snapshot loading.
//!
//! Records live in-memory in `Collection` instances grouped by a `Database`.
//! Collections are filled once from JSON snapshots at start-up and are
//! read-only afterwards.

/// Collection and database data structures.
pub mod collection;
/// Snapshot loading from the data directory.
pub mod persistence;

pub use collection::{Collection, Database};
pub use persistence::{load_collection, load_database, snapshot_path};
