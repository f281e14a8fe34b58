//! Collection and database data structures.
//!
//! A [`Collection`] holds the records of one named collection in load order.
//! [`Database`] groups the six typed collections and dispatches field and
//! number lookups by [`Variant`].

use crate::language::Variant;
use crate::record::{
    HindiKuralRecord, KuralRecord, LanguageQuestionRecord, QuestionEntry, QuestionRecord, Record,
    RussianKuralRecord, VerseRecord,
};
use crate::search::FilterSet;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// A thread-safe, ordered collection of records.
///
/// Cloning a `Collection` produces a new handle to the same shared data.
#[derive(Debug)]
pub struct Collection<R> {
    name: String,
    records: Arc<RwLock<Vec<Arc<R>>>>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            records: Arc::clone(&self.records),
        }
    }
}

impl<R: Record> Collection<R> {
    /// Creates a new empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates a collection holding `records` in the given order.
    pub fn with_records(name: impl Into<String>, records: Vec<R>) -> Self {
        let collection = Self::new(name);
        collection.extend(records);
        collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends records, preserving their order.
    pub fn extend(&self, records: impl IntoIterator<Item = R>) {
        self.records
            .write()
            .extend(records.into_iter().map(Arc::new));
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Records matching every filter exactly, in store order.
    pub fn find_by_fields(&self, filter: &FilterSet) -> Vec<Arc<R>> {
        self.records
            .read()
            .iter()
            .filter(|r| filter.matches(r.as_ref()))
            .cloned()
            .collect()
    }

    /// Records whose number is in `numbers`, in store order.
    ///
    /// Numbers with no record are skipped; an empty result is not an error.
    pub fn find_by_numbers(&self, numbers: &HashSet<i64>) -> Vec<Arc<R>> {
        if numbers.is_empty() {
            return Vec::new();
        }
        self.records
            .read()
            .iter()
            .filter(|r| numbers.contains(&r.number()))
            .cloned()
            .collect()
    }

    /// Every record, in store order.
    pub fn all(&self) -> Vec<Arc<R>> {
        self.records.read().clone()
    }
}

/// Database holds every language variant's verse and question collections.
#[derive(Debug, Clone)]
pub struct Database {
    pub kurals: Collection<KuralRecord>,
    pub hindi_kurals: Collection<HindiKuralRecord>,
    pub russian_kurals: Collection<RussianKuralRecord>,
    pub questions: Collection<QuestionRecord>,
    pub hindi_questions: Collection<LanguageQuestionRecord>,
    pub russian_questions: Collection<LanguageQuestionRecord>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            kurals: Collection::new(Variant::Base.verse_collection()),
            hindi_kurals: Collection::new(Variant::Hindi.verse_collection()),
            russian_kurals: Collection::new(Variant::Russian.verse_collection()),
            questions: Collection::new(Variant::Base.question_collection()),
            hindi_questions: Collection::new(Variant::Hindi.question_collection()),
            russian_questions: Collection::new(Variant::Russian.question_collection()),
        }
    }
}

impl Database {
    /// Creates a database with six empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verses of `variant` matching `filter` exactly.
    pub fn find_verses_by_fields(&self, variant: Variant, filter: &FilterSet) -> Vec<VerseRecord> {
        match variant {
            Variant::Base => wrap(self.kurals.find_by_fields(filter), VerseRecord::Base),
            Variant::Hindi => wrap(self.hindi_kurals.find_by_fields(filter), VerseRecord::Hindi),
            Variant::Russian => wrap(
                self.russian_kurals.find_by_fields(filter),
                VerseRecord::Russian,
            ),
        }
    }

    /// Verses of `variant` whose number is in `numbers`.
    pub fn find_verses_by_numbers(
        &self,
        variant: Variant,
        numbers: &HashSet<i64>,
    ) -> Vec<VerseRecord> {
        match variant {
            Variant::Base => wrap(self.kurals.find_by_numbers(numbers), VerseRecord::Base),
            Variant::Hindi => wrap(
                self.hindi_kurals.find_by_numbers(numbers),
                VerseRecord::Hindi,
            ),
            Variant::Russian => wrap(
                self.russian_kurals.find_by_numbers(numbers),
                VerseRecord::Russian,
            ),
        }
    }

    /// Questions of `variant` matching `filter` exactly.
    pub fn find_questions_by_fields(
        &self,
        variant: Variant,
        filter: &FilterSet,
    ) -> Vec<QuestionEntry> {
        match variant {
            Variant::Base => wrap(self.questions.find_by_fields(filter), QuestionEntry::Base),
            Variant::Hindi => wrap(
                self.hindi_questions.find_by_fields(filter),
                QuestionEntry::Language,
            ),
            Variant::Russian => wrap(
                self.russian_questions.find_by_fields(filter),
                QuestionEntry::Language,
            ),
        }
    }

    /// Questions of `variant` whose number is in `numbers`.
    pub fn find_questions_by_numbers(
        &self,
        variant: Variant,
        numbers: &HashSet<i64>,
    ) -> Vec<QuestionEntry> {
        match variant {
            Variant::Base => wrap(self.questions.find_by_numbers(numbers), QuestionEntry::Base),
            Variant::Hindi => wrap(
                self.hindi_questions.find_by_numbers(numbers),
                QuestionEntry::Language,
            ),
            Variant::Russian => wrap(
                self.russian_questions.find_by_numbers(numbers),
                QuestionEntry::Language,
            ),
        }
    }

    /// `(collection name, record count)` for every collection.
    pub fn collection_counts(&self) -> Vec<(String, usize)> {
        vec![
            (self.kurals.name().to_string(), self.kurals.len()),
            (self.hindi_kurals.name().to_string(), self.hindi_kurals.len()),
            (self.russian_kurals.name().to_string(), self.russian_kurals.len()),
            (self.questions.name().to_string(), self.questions.len()),
            (self.hindi_questions.name().to_string(), self.hindi_questions.len()),
            (self.russian_questions.name().to_string(), self.russian_questions.len()),
        ]
    }
}

fn wrap<R, T>(records: Vec<Arc<R>>, f: impl Fn(Arc<R>) -> T) -> Vec<T> {
    records.into_iter().map(f).collect()
}
