//! # kural-core
//!
//! Data layer of the kural query backend: language and variant tables,
//! typed verse and question records, the in-memory record store, field
//! filtering, embedding similarity, and chapter/section/verse aggregation.
//!
//! This crate has no async dependencies. The HTTP surface and the external
//! scorer gateway live in `kural-server`.

/// Chapter → section → verse grouping with occurrence counts.
pub mod aggregate;
/// Global configuration constants: collection names, defaults, and limits.
pub mod config;
/// Store error type.
pub mod error;
/// Language selectors, store variants, and field tables.
pub mod language;
/// English word list.
pub mod lexicon;
/// Verse and question record shapes.
pub mod record;
/// Field filters and embedding similarity.
pub mod search;
/// Collections, the database, and snapshot loading.
pub mod storage;

pub use error::StoreError;
pub use language::{FieldMapping, Language, UnknownLanguage, Variant};
pub use lexicon::EnglishLexicon;
pub use record::{QuestionEntry, Record, VerseRecord};
