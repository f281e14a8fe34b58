//! Loading collections from JSON snapshot files.
//!
//! Each collection lives in `<data_dir>/<COLLECTION>.json` as a JSON array of
//! records. Snapshots are produced by the import tooling; this side only reads.
//! A missing file leaves the collection empty; a malformed one is an error.

use crate::config;
use crate::error::{Result, StoreError};
use crate::record::Record;
use crate::storage::collection::{Collection, Database};
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Path of a collection's snapshot file inside `dir`.
pub fn snapshot_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{}.{}", collection, config::SNAPSHOT_EXTENSION))
}

/// Reads one collection snapshot into `collection`, returning the number of records loaded.
///
/// Returns `Ok(0)` without touching the collection if the file does not exist.
pub fn load_collection<R>(collection: &Collection<R>, dir: &Path) -> Result<usize>
where
    R: Record + DeserializeOwned,
{
    let path = snapshot_path(dir, collection.name());
    let raw = match fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(
                "No snapshot for collection '{}' at {}, starting empty",
                collection.name(),
                path.display()
            );
            return Ok(0);
        }
        Err(source) => return Err(StoreError::Io { path, source }),
    };
    let records: Vec<R> =
        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;
    let count = records.len();
    collection.extend(records);
    tracing::info!(
        "Loaded collection '{}' ({} records, {} bytes)",
        collection.name(),
        count,
        raw.len()
    );
    Ok(count)
}

/// Loads every collection of a [`Database`] from `dir`.
pub fn load_database(dir: &Path) -> Result<Database> {
    let db = Database::new();
    load_collection(&db.kurals, dir)?;
    load_collection(&db.hindi_kurals, dir)?;
    load_collection(&db.russian_kurals, dir)?;
    load_collection(&db.questions, dir)?;
    load_collection(&db.hindi_questions, dir)?;
    load_collection(&db.russian_questions, dir)?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Variant;
    use tempfile::TempDir;

    fn write_snapshot(dir: &Path, collection: &str, body: &str) {
        fs::write(snapshot_path(dir, collection), body).unwrap();
    }

    #[test]
    fn test_snapshot_path() {
        let p = snapshot_path(Path::new("/data"), "DETAIL1");
        assert_eq!(p, PathBuf::from("/data/DETAIL1.json"));
    }

    #[test]
    fn test_load_database_with_missing_files_is_empty() {
        let tmp = TempDir::new().unwrap();
        let db = load_database(tmp.path()).unwrap();
        assert!(db.collection_counts().iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_load_database_reads_snapshots() {
        let tmp = TempDir::new().unwrap();
        write_snapshot(
            tmp.path(),
            "HINDI_DETAIL",
            r#"[{"chapter": "धर्म", "chapter_group": "भूमिका", "section": "ईश्वर स्तुति",
                 "translation": "...", "number": 1},
                {"chapter": "धर्म", "chapter_group": "भूमिका", "section": "वर्षा महिमा",
                 "translation": "...", "number": 11}]"#,
        );
        write_snapshot(
            tmp.path(),
            "DETAIL2",
            r#"[{"inputs": "q", "targets": "a", "english_input": "q", "number": 1}]"#,
        );
        let db = load_database(tmp.path()).unwrap();
        assert_eq!(db.hindi_kurals.len(), 2);
        assert_eq!(db.questions.len(), 1);
        assert_eq!(db.kurals.len(), 0);
        let numbers = [11].into_iter().collect();
        let found = db.find_verses_by_numbers(Variant::Hindi, &numbers);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_load_malformed_snapshot_fails() {
        let tmp = TempDir::new().unwrap();
        write_snapshot(tmp.path(), "RUSSIAN_DETAIL", r#"[{"Chapter": "x"}]"#);
        let err = load_database(tmp.path()).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
        assert!(err.to_string().contains("RUSSIAN_DETAIL.json"));
    }
}
