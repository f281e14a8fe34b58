//! Request and response data transfer objects for the REST API.
//!
//! Verse and question results are serialized straight from the core record
//! types; only the envelopes that have no core counterpart live here.

use serde::{Deserialize, Serialize};

/// Query string of `GET /api/all-details`.
#[derive(Debug, Deserialize)]
pub struct SelectorQuery {
    #[serde(rename = "selectedLanguage")]
    pub selected_language: Option<String>,
}

/// Request body for `POST /api/compare`.
///
/// Missing fields deserialize as empty strings and are rejected by validation
/// with a 400 rather than by the JSON extractor.
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub field: String,
}

/// Query string of `GET /api/is-english`.
#[derive(Debug, Deserialize)]
pub struct IsEnglishQuery {
    pub word: Option<String>,
}

/// Response body for `GET /api/is-english`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsEnglishResponse {
    pub is_english: bool,
}

/// Record count of one collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub document_count: usize,
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub collections: Vec<CollectionInfo>,
    pub embeddings_loaded: usize,
    pub lexicon_words: usize,
}
