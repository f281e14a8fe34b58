//! Record Store Adapter.
//!
//! [`RecordStore`] is the async seam the resolver reads through. The in-memory
//! [`Database`] from `kural-core` is the production implementation; tests plug
//! in stubs to simulate transport failures.

use async_trait::async_trait;
use kural_core::search::FilterSet;
use kural_core::storage::Database;
use kural_core::{QuestionEntry, StoreError, Variant, VerseRecord};
use std::collections::HashSet;

/// Typed access to verse and question collections across variants.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Verses matching every filter exactly. An empty filter set returns the
    /// whole collection in store order.
    async fn find_verses_by_fields(
        &self,
        variant: Variant,
        filter: &FilterSet,
    ) -> Result<Vec<VerseRecord>, StoreError>;

    /// Verses whose number is in `numbers`. Unknown numbers are skipped.
    async fn find_verses_by_numbers(
        &self,
        variant: Variant,
        numbers: &HashSet<i64>,
    ) -> Result<Vec<VerseRecord>, StoreError>;

    async fn find_questions_by_fields(
        &self,
        variant: Variant,
        filter: &FilterSet,
    ) -> Result<Vec<QuestionEntry>, StoreError>;

    async fn find_questions_by_numbers(
        &self,
        variant: Variant,
        numbers: &HashSet<i64>,
    ) -> Result<Vec<QuestionEntry>, StoreError>;

    /// `(collection, record count)` pairs for health reporting.
    fn collection_counts(&self) -> Vec<(String, usize)>;
}

#[async_trait]
impl RecordStore for Database {
    async fn find_verses_by_fields(
        &self,
        variant: Variant,
        filter: &FilterSet,
    ) -> Result<Vec<VerseRecord>, StoreError> {
        Ok(Database::find_verses_by_fields(self, variant, filter))
    }

    async fn find_verses_by_numbers(
        &self,
        variant: Variant,
        numbers: &HashSet<i64>,
    ) -> Result<Vec<VerseRecord>, StoreError> {
        Ok(Database::find_verses_by_numbers(self, variant, numbers))
    }

    async fn find_questions_by_fields(
        &self,
        variant: Variant,
        filter: &FilterSet,
    ) -> Result<Vec<QuestionEntry>, StoreError> {
        Ok(Database::find_questions_by_fields(self, variant, filter))
    }

    async fn find_questions_by_numbers(
        &self,
        variant: Variant,
        numbers: &HashSet<i64>,
    ) -> Result<Vec<QuestionEntry>, StoreError> {
        Ok(Database::find_questions_by_numbers(self, variant, numbers))
    }

    fn collection_counts(&self) -> Vec<(String, usize)> {
        Database::collection_counts(self)
    }
}
