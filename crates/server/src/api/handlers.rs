//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::metrics;
use crate::api::models::*;
use crate::resolver::{ResolveError, Resolver};
use crate::scorer::Scorer;
use crate::store::RecordStore;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use kural_core::aggregate::AggregateTree;
use kural_core::search::{EmbeddingTable, RankedRecord};
use kural_core::{EnglishLexicon, QuestionEntry, VerseRecord};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub scorer: Arc<dyn Scorer>,
    /// Preloaded per-field verse embeddings for `/api/compare`.
    pub embeddings: Arc<EmbeddingTable>,
    pub lexicon: Arc<EnglishLexicon>,
    /// `None` when no global recorder could be installed (tests).
    pub prometheus_handle: Option<PrometheusHandle>,
    pub start_time: Instant,
}

impl AppState {
    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            self.store.as_ref(),
            self.scorer.as_ref(),
            self.embeddings.as_ref(),
        )
    }
}

/// Counts the outcome of a resolver call and converts its error.
fn observe<T>(operation: &str, result: Result<T, ResolveError>) -> Result<T, ApiError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ResolveError::NotFound(_)) => "not_found",
        Err(
            ResolveError::NoFilterProvided
            | ResolveError::InvalidFilter(_)
            | ResolveError::InvalidLanguageSelection(_),
        ) => "invalid",
        Err(ResolveError::UpstreamScorerFailure(_)) => "scorer_error",
        Err(ResolveError::Store(_)) => "store_error",
    };
    metrics::record_resolution(operation, outcome);
    result.map_err(ApiError::from)
}

/// `GET /api/kurals`
pub async fn get_kurals(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<VerseRecord>>, ApiError> {
    let Query(params) = params?;
    let records = observe("kurals", state.resolver().resolve_verses(&params).await)?;
    Ok(Json(records))
}

/// `GET /api/kurals/lookup`
pub async fn lookup_kurals(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<VerseRecord>>, ApiError> {
    let Query(params) = params?;
    let records = observe("lookup", state.resolver().lookup_verses(&params).await)?;
    Ok(Json(records))
}

/// `GET /api/questions`
pub async fn get_questions(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<QuestionEntry>>, ApiError> {
    let Query(params) = params?;
    let records = observe("questions", state.resolver().resolve_questions(&params).await)?;
    Ok(Json(records))
}

/// `GET /api/questions/lookup`
pub async fn lookup_questions(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<QuestionEntry>>, ApiError> {
    let Query(params) = params?;
    let records = observe(
        "questions_lookup",
        state.resolver().lookup_questions(&params).await,
    )?;
    Ok(Json(records))
}

/// `GET /api/all-details`
pub async fn all_details(
    State(state): State<AppState>,
    query: Result<Query<SelectorQuery>, QueryRejection>,
) -> Result<Json<AggregateTree>, ApiError> {
    let Query(query) = query?;
    let tree = observe(
        "all_details",
        state
            .resolver()
            .all_details(query.selected_language.as_deref())
            .await,
    )?;
    Ok(Json(tree))
}

/// `POST /api/compare`
pub async fn compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<Vec<RankedRecord<VerseRecord>>>, ApiError> {
    let Json(req) = payload?;
    let ranked = observe(
        "compare",
        state.resolver().compare(&req.text, &req.field).await,
    )?;
    Ok(Json(ranked))
}

/// `GET /api/is-english`
pub async fn is_english(
    State(state): State<AppState>,
    Query(query): Query<IsEnglishQuery>,
) -> Json<IsEnglishResponse> {
    let is_english = query
        .word
        .as_deref()
        .map(|w| state.lexicon.contains(w))
        .unwrap_or(false);
    Json(IsEnglishResponse { is_english })
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let collections = state
        .store
        .collection_counts()
        .into_iter()
        .map(|(name, document_count)| CollectionInfo {
            name,
            document_count,
        })
        .collect();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            collections,
            embeddings_loaded: state.embeddings.len(),
            lexicon_words: state.lexicon.len(),
        }),
    )
}

/// `GET /metrics`
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state
        .prometheus_handle
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Any unmatched route.
pub async fn fallback() -> ApiError {
    ApiError::NotFound("Endpoint not found".into())
}
