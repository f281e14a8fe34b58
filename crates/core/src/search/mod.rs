//! Search primitives: field filters, similarity ranking, and ranked results.

/// Ordered field filters and scorer token building.
pub mod filter;
/// Cosine similarity and the preloaded embedding table.
pub mod similarity;
/// Ranked record type.
pub mod types;

pub use filter::{FieldFilter, FilterSet};
pub use similarity::{cosine_similarity, EmbeddingTable};
pub use types::RankedRecord;
