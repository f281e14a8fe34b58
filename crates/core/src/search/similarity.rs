//! Cosine similarity ranking against a preloaded embedding table.
//!
//! The embedding table maps `(field, number)` to a precomputed vector for that
//! record field. It is loaded once at start-up and shared read-only.

use crate::error::{Result, StoreError};
use crate::record::Record;
use crate::search::types::RankedRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Cosine similarity in `[-1, 1]`. Returns 0.0 if either vector has zero
/// magnitude or the dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// One row of the embeddings file.
#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    number: i64,
    field: String,
    embedding: Vec<f32>,
}

/// Precomputed record-field embeddings: field name → record number → vector.
#[derive(Debug, Default)]
pub struct EmbeddingTable {
    by_field: HashMap<String, HashMap<i64, Vec<f32>>>,
}

impl EmbeddingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON array of `{number, field, embedding}` rows.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<EmbeddingEntry> =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.field, entry.number, entry.embedding);
        }
        tracing::info!(
            "Loaded {} embeddings from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn insert(&mut self, field: impl Into<String>, number: i64, embedding: Vec<f32>) {
        self.by_field
            .entry(field.into())
            .or_default()
            .insert(number, embedding);
    }

    pub fn get(&self, field: &str, number: i64) -> Option<&[f32]> {
        self.by_field
            .get(field)
            .and_then(|m| m.get(&number))
            .map(Vec::as_slice)
    }

    /// Total number of stored vectors.
    pub fn len(&self) -> usize {
        self.by_field.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scores every record on `field` against `query` and sorts descending.
    ///
    /// Records without a stored embedding score 0.0. The sort is stable, so
    /// equal scores keep input order.
    pub fn rank<R: Record + Clone>(
        &self,
        records: &[R],
        field: &str,
        query: &[f32],
    ) -> Vec<RankedRecord<R>> {
        let mut ranked: Vec<RankedRecord<R>> = records
            .iter()
            .map(|record| {
                let similarity = self
                    .get(field, record.number())
                    .map(|stored| cosine_similarity(query, stored))
                    .unwrap_or(0.0);
                RankedRecord {
                    record: record.clone(),
                    similarity,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked
    }
}
