//! Query Resolver.
//!
//! Turns raw query parameters into records:
//!
//! 1. pick the store variant from `selectedLanguage` (permissive, unknown → base),
//! 2. build the filter set from that variant's field table and reject empty sets,
//! 3. dispatch the filter tokens to the scorer,
//! 4. look the returned numbers up in the store.
//!
//! An empty candidate list and an empty store lookup are both `NotFound`.
//! Candidates missing from the store are dropped without error. The exact
//! lookup path skips the scorer and filters the store directly.
//!
//! The aggregate view is stricter: it needs an exact [`Language`] to pick a
//! field mapping, so unknown selectors fail with `InvalidLanguageSelection`.

use crate::scorer::{Scorer, ScorerError, ScorerKind};
use crate::store::RecordStore;
use kural_core::aggregate::{build_tree, AggregateTree};
use kural_core::config;
use kural_core::language::BASE_VERSE_FIELDS;
use kural_core::search::{EmbeddingTable, FilterSet, RankedRecord};
use kural_core::{Language, QuestionEntry, StoreError, Variant, VerseRecord};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Query parameter carrying the language selector.
pub const SELECTOR_PARAM: &str = "selectedLanguage";

/// Resolution failures and empty outcomes.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// None of the variant's filter fields carried a value.
    #[error("No valid query parameters provided")]
    NoFilterProvided,

    /// A filter or compare argument is malformed.
    #[error("{0}")]
    InvalidFilter(String),

    /// The aggregate view needs an exact language name.
    #[error("Invalid language selection: {0}")]
    InvalidLanguageSelection(String),

    /// Resolution produced no records. Carries what was searched for.
    #[error("No {0} found for the given parameters")]
    NotFound(&'static str),

    #[error("Scorer failure: {0}")]
    UpstreamScorerFailure(#[from] ScorerError),

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

/// Borrowed view over the collaborators a request needs.
pub struct Resolver<'a> {
    store: &'a dyn RecordStore,
    scorer: &'a dyn Scorer,
    embeddings: &'a EmbeddingTable,
}

fn selector(params: &HashMap<String, String>) -> Option<&str> {
    params.get(SELECTOR_PARAM).map(String::as_str)
}

/// Canonical selector token for the scorer, or none when the selector is not
/// an exact language name.
fn scorer_selector(selector: Option<&str>) -> Option<&'static str> {
    selector
        .and_then(|s| s.parse::<Language>().ok())
        .map(Language::as_str)
}

fn build_filters(
    table: &'static [&'static str],
    params: &HashMap<String, String>,
) -> Result<FilterSet, ResolveError> {
    let filters = FilterSet::from_params(table, params);
    if filters.is_empty() {
        return Err(ResolveError::NoFilterProvided);
    }
    if let Some(f) = filters
        .iter()
        .find(|f| f.value.len() > config::MAX_FILTER_VALUE_LEN)
    {
        return Err(ResolveError::InvalidFilter(format!(
            "Value of '{}' exceeds {} bytes",
            f.field,
            config::MAX_FILTER_VALUE_LEN
        )));
    }
    Ok(filters)
}

fn non_empty<T>(records: Vec<T>, what: &'static str) -> Result<Vec<T>, ResolveError> {
    if records.is_empty() {
        Err(ResolveError::NotFound(what))
    } else {
        Ok(records)
    }
}

const VERSES: &str = "Kural details";
const QUESTIONS: &str = "questions";

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        scorer: &'a dyn Scorer,
        embeddings: &'a EmbeddingTable,
    ) -> Self {
        Self {
            store,
            scorer,
            embeddings,
        }
    }

    /// Runs a candidate scorer and returns the distinct candidate numbers.
    async fn candidates(
        &self,
        kind: ScorerKind,
        selector: Option<&str>,
        filters: &FilterSet,
        what: &'static str,
    ) -> Result<HashSet<i64>, ResolveError> {
        let tokens = filters.scorer_tokens(scorer_selector(selector));
        let numbers = self.scorer.candidates(kind, &tokens).await?;
        if numbers.is_empty() {
            tracing::debug!(role = %kind, "Scorer returned no candidates");
            return Err(ResolveError::NotFound(what));
        }
        Ok(numbers.into_iter().collect())
    }

    /// Verses matching the filters in `params`, via the verse scorer.
    pub async fn resolve_verses(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Vec<VerseRecord>, ResolveError> {
        let selector = selector(params);
        let variant = Variant::from_selector(selector);
        let filters = build_filters(variant.verse_fields(), params)?;
        let numbers = self
            .candidates(ScorerKind::Verses, selector, &filters, VERSES)
            .await?;
        let records = self.store.find_verses_by_numbers(variant, &numbers).await?;
        tracing::debug!(
            variant = %variant,
            candidates = numbers.len(),
            found = records.len(),
            "Resolved verse candidates"
        );
        non_empty(records, VERSES)
    }

    /// Questions matching the filters in `params`, via the question scorer.
    pub async fn resolve_questions(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Vec<QuestionEntry>, ResolveError> {
        let selector = selector(params);
        let variant = Variant::from_selector(selector);
        let filters = build_filters(variant.question_fields(), params)?;
        let numbers = self
            .candidates(ScorerKind::Questions, selector, &filters, QUESTIONS)
            .await?;
        let records = self
            .store
            .find_questions_by_numbers(variant, &numbers)
            .await?;
        tracing::debug!(
            variant = %variant,
            candidates = numbers.len(),
            found = records.len(),
            "Resolved question candidates"
        );
        non_empty(records, QUESTIONS)
    }

    /// Verses whose fields equal the filters in `params` exactly. No scorer call.
    pub async fn lookup_verses(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Vec<VerseRecord>, ResolveError> {
        let variant = Variant::from_selector(selector(params));
        let filters = build_filters(variant.verse_fields(), params)?;
        let records = self.store.find_verses_by_fields(variant, &filters).await?;
        non_empty(records, VERSES)
    }

    /// Questions whose fields equal the filters in `params` exactly. No scorer call.
    pub async fn lookup_questions(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Vec<QuestionEntry>, ResolveError> {
        let variant = Variant::from_selector(selector(params));
        let filters = build_filters(variant.question_fields(), params)?;
        let records = self.store.find_questions_by_fields(variant, &filters).await?;
        non_empty(records, QUESTIONS)
    }

    /// Chapter/section/verse tree of every verse in the selected language.
    pub async fn all_details(&self, selector: Option<&str>) -> Result<AggregateTree, ResolveError> {
        let selector = selector.ok_or_else(|| {
            ResolveError::InvalidLanguageSelection(format!("missing '{SELECTOR_PARAM}'"))
        })?;
        let language: Language = selector
            .parse()
            .map_err(|e: kural_core::UnknownLanguage| {
                ResolveError::InvalidLanguageSelection(e.to_string())
            })?;
        let records = self
            .store
            .find_verses_by_fields(language.variant(), &FilterSet::new())
            .await?;
        Ok(build_tree(&records, &language.field_mapping()))
    }

    /// Every base verse ranked by similarity between `text` and its stored
    /// embedding for `field`.
    pub async fn compare(
        &self,
        text: &str,
        field: &str,
    ) -> Result<Vec<RankedRecord<VerseRecord>>, ResolveError> {
        if text.trim().is_empty() {
            return Err(ResolveError::InvalidFilter("'text' must not be empty".into()));
        }
        if text.len() > config::MAX_COMPARE_TEXT_LEN {
            return Err(ResolveError::InvalidFilter(format!(
                "'text' exceeds {} bytes",
                config::MAX_COMPARE_TEXT_LEN
            )));
        }
        let field = BASE_VERSE_FIELDS
            .iter()
            .copied()
            .find(|f| *f == field)
            .ok_or_else(|| ResolveError::InvalidFilter(format!("Unknown field '{field}'")))?;

        let query = self.scorer.embed(text, field).await?;
        let records = self
            .store
            .find_verses_by_fields(Variant::Base, &FilterSet::new())
            .await?;
        Ok(self.embeddings.rank(&records, field, &query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kural_core::record::{HindiKuralRecord, KuralRecord, LanguageQuestionRecord};
    use kural_core::storage::Database;
    use kural_core::Record;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Scorer that replays a canned outcome and records every call.
    struct StubScorer {
        reply: fn() -> Result<Vec<i64>, ScorerError>,
        embedding: Vec<f32>,
        calls: Mutex<Vec<(ScorerKind, Vec<String>)>>,
    }

    impl StubScorer {
        fn new(reply: fn() -> Result<Vec<i64>, ScorerError>) -> Self {
            Self {
                reply,
                embedding: vec![1.0, 0.0],
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(ScorerKind, Vec<String>)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Scorer for StubScorer {
        async fn candidates(
            &self,
            kind: ScorerKind,
            tokens: &[String],
        ) -> Result<Vec<i64>, ScorerError> {
            self.calls.lock().push((kind, tokens.to_vec()));
            (self.reply)()
        }

        async fn embed(&self, text: &str, field: &str) -> Result<Vec<f32>, ScorerError> {
            self.calls
                .lock()
                .push((ScorerKind::Embed, vec![text.to_string(), field.to_string()]));
            Ok(self.embedding.clone())
        }
    }

    /// Store whose every read fails.
    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        async fn find_verses_by_fields(
            &self,
            _: Variant,
            _: &FilterSet,
        ) -> Result<Vec<VerseRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find_verses_by_numbers(
            &self,
            _: Variant,
            _: &HashSet<i64>,
        ) -> Result<Vec<VerseRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find_questions_by_fields(
            &self,
            _: Variant,
            _: &FilterSet,
        ) -> Result<Vec<QuestionEntry>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find_questions_by_numbers(
            &self,
            _: Variant,
            _: &HashSet<i64>,
        ) -> Result<Vec<QuestionEntry>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn collection_counts(&self) -> Vec<(String, usize)> {
            Vec::new()
        }
    }

    fn kural(number: i64, chapter: &str) -> KuralRecord {
        KuralRecord {
            chapter_name: chapter.into(),
            section_name: "பாயிரவியல்".into(),
            verse: format!("verse {number}"),
            translation: format!("translation {number}"),
            explanation: String::new(),
            number,
            chapter: None,
            chapter_eng: Some(format!("{chapter} (en)")),
            chapter_group_eng: None,
            chapter_group_tam: None,
            chapter_group_trans: None,
            section_eng: Some("Prologue".into()),
            section_trans: None,
        }
    }

    fn seeded_db() -> Database {
        let db = Database::new();
        db.kurals
            .extend(vec![kural(3, "Beta"), kural(7, "Alpha"), kural(11, "Gamma")]);
        db.hindi_kurals.extend(vec![HindiKuralRecord {
            chapter: "धर्म".into(),
            chapter_group: "भूमिका".into(),
            section: "ईश्वर स्तुति".into(),
            translation: "...".into(),
            number: 3,
        }]);
        db.hindi_questions.extend(vec![LanguageQuestionRecord {
            input: "धर्म क्या है".into(),
            target: "...".into(),
            number: 7,
        }]);
        db
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn numbers_of<R: Record>(records: &[R]) -> Vec<i64> {
        let mut n: Vec<i64> = records.iter().map(Record::number).collect();
        n.sort_unstable();
        n
    }

    #[tokio::test]
    async fn test_unmatched_candidates_are_dropped() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3, 7, 99]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let records = resolver
            .resolve_verses(&params(&[("chapterName", "Beta")]))
            .await
            .unwrap();
        assert_eq!(numbers_of(&records), vec![3, 7]);
    }

    #[tokio::test]
    async fn test_empty_candidates_is_not_found() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(Vec::new()));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let err = resolver
            .resolve_verses(&params(&[("verse", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stale_candidates_is_not_found() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![500, 501]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let err = resolver
            .resolve_verses(&params(&[("verse", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_no_filter_skips_scorer() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let err = resolver
            .resolve_verses(&params(&[("selectedLanguage", "Tamil"), ("bogus", "x"), ("verse", "")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoFilterProvided));
        assert!(scorer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_filters_validated_against_selected_variant() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        // chapterName is a base field, not a Hindi one.
        let err = resolver
            .resolve_verses(&params(&[("selectedLanguage", "Hindi"), ("chapterName", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoFilterProvided));
        assert!(scorer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_selector_token_leads_and_pairs_follow_table_order() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let records = resolver
            .resolve_verses(&params(&[
                ("selectedLanguage", "Hindi"),
                ("section", "ईश्वर स्तुति"),
                ("chapter", "धर्म"),
            ]))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].variant(), Variant::Hindi);

        let calls = scorer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, ScorerKind::Verses);
        assert_eq!(
            calls[0].1,
            vec!["Hindi", "धर्म", "chapter", "ईश्वर स्तुति", "section"]
        );
    }

    #[tokio::test]
    async fn test_unknown_selector_falls_back_to_base_without_token() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let records = resolver
            .resolve_verses(&params(&[("selectedLanguage", "Klingon"), ("verse", "v")]))
            .await
            .unwrap();
        assert_eq!(records[0].variant(), Variant::Base);
        assert_eq!(scorer.calls()[0].1, vec!["v", "verse"]);
    }

    #[tokio::test]
    async fn test_scorer_failure_propagates() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| {
            Err(ScorerError::Process {
                status: "exit status: 1".into(),
                stderr: "model load failed".into(),
            })
        });
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let err = resolver
            .resolve_verses(&params(&[("verse", "x")]))
            .await
            .unwrap_err();
        match err {
            ResolveError::UpstreamScorerFailure(inner) => {
                assert_eq!(inner.detail(), "model load failed")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_propagates_as_scorer_failure() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Err(ScorerError::Timeout(Duration::from_secs(60))));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let err = resolver
            .resolve_questions(&params(&[("inputs", "q")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UpstreamScorerFailure(ScorerError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&DownStore, &scorer, &embeddings);

        let err = resolver
            .resolve_verses(&params(&[("verse", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Store(_)));
        let err = resolver.all_details(Some("Tamil")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Store(_)));
    }

    #[tokio::test]
    async fn test_resolve_questions_uses_language_variant() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![7, 8]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let records = resolver
            .resolve_questions(&params(&[("selectedLanguage", "Hindi"), ("input", "धर्म")]))
            .await
            .unwrap();
        assert_eq!(numbers_of(&records), vec![7]);
        assert_eq!(scorer.calls()[0].0, ScorerKind::Questions);
        assert_eq!(scorer.calls()[0].1, vec!["Hindi", "धर्म", "input"]);
    }

    #[tokio::test]
    async fn test_lookup_is_exact_and_skips_scorer() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let records = resolver
            .lookup_verses(&params(&[("chapterName", "Alpha")]))
            .await
            .unwrap();
        assert_eq!(numbers_of(&records), vec![7]);

        let err = resolver
            .lookup_verses(&params(&[("chapterName", "Alph")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
        assert!(scorer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_question_lookup_is_exact_and_skips_scorer() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![1]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let records = resolver
            .lookup_questions(&params(&[
                (SELECTOR_PARAM, "Hindi"),
                ("input", "धर्म क्या है"),
            ]))
            .await
            .unwrap();
        assert_eq!(numbers_of(&records), vec![7]);

        let err = resolver
            .lookup_questions(&params(&[(SELECTOR_PARAM, "Hindi"), ("input", "धर्म")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound("questions")));

        let err = resolver
            .lookup_questions(&params(&[(SELECTOR_PARAM, "Hindi"), ("inputs", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoFilterProvided));
        assert!(scorer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_question_lookup_store_failure() {
        let scorer = StubScorer::new(|| Ok(vec![1]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&DownStore, &scorer, &embeddings);

        let err = resolver
            .lookup_questions(&params(&[("inputs", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Store(_)));
    }

    #[tokio::test]
    async fn test_oversized_filter_value_rejected() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(vec![3]));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let long = "x".repeat(config::MAX_FILTER_VALUE_LEN + 1);
        let err = resolver
            .resolve_verses(&params(&[("verse", long.as_str())]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidFilter(_)));
        assert!(scorer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_all_details_requires_exact_language() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(Vec::new()));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        for bad in [None, Some(""), Some("tamil"), Some("Klingon")] {
            let err = resolver.all_details(bad).await.unwrap_err();
            assert!(
                matches!(err, ResolveError::InvalidLanguageSelection(_)),
                "{bad:?}"
            );
        }

        let tree = resolver.all_details(Some("Tamil")).await.unwrap();
        let chapters: Vec<_> = tree.iter().map(|c| c.chapter.as_deref()).collect();
        assert_eq!(chapters, vec![Some("Alpha"), Some("Beta"), Some("Gamma")]);

        let tree = resolver.all_details(Some("English")).await.unwrap();
        assert_eq!(tree[0].chapter.as_deref(), Some("Alpha (en)"));
        assert_eq!(tree[0].sections[0].section_name.as_deref(), Some("Prologue"));

        let tree = resolver.all_details(Some("Hindi")).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert!(scorer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_compare_ranks_by_stored_embedding() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(Vec::new()));
        let mut embeddings = EmbeddingTable::new();
        embeddings.insert("translation", 3, vec![0.0, 1.0]);
        embeddings.insert("translation", 11, vec![1.0, 0.0]);
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        let ranked = resolver.compare("rain", "translation").await.unwrap();
        let order: Vec<i64> = ranked.iter().map(|r| r.record.number()).collect();
        assert_eq!(order, vec![11, 3, 7]);
        assert!((ranked[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(ranked[2].similarity, 0.0);
        assert_eq!(
            scorer.calls(),
            vec![(ScorerKind::Embed, vec!["rain".to_string(), "translation".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_compare_validates_input() {
        let db = seeded_db();
        let scorer = StubScorer::new(|| Ok(Vec::new()));
        let embeddings = EmbeddingTable::new();
        let resolver = Resolver::new(&db, &scorer, &embeddings);

        assert!(matches!(
            resolver.compare("   ", "translation").await,
            Err(ResolveError::InvalidFilter(_))
        ));
        assert!(matches!(
            resolver.compare("rain", "chapter").await,
            Err(ResolveError::InvalidFilter(_))
        ));
        assert!(scorer.calls().is_empty());
    }
}
