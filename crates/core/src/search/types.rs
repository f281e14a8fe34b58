//! Scored record types for similarity results.

use serde::Serialize;

/// A record with its similarity to a query.
///
/// Serializes as the record's own fields plus a `similarity` number.
#[derive(Debug, Clone, Serialize)]
pub struct RankedRecord<R> {
    #[serde(flatten)]
    pub record: R,
    pub similarity: f32,
}
