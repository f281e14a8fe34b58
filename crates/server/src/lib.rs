//! kural-server — HTTP query backend for the multilingual kural corpus.
//!
//! Provides the REST API, the external scorer gateway, and the query
//! resolver. Records, field tables and aggregation live in `kural-core`.

/// REST API layer: Axum router, HTTP handlers, models, errors, metrics.
pub mod api;
/// Query resolution: filter validation, scorer dispatch, store lookup.
pub mod resolver;
/// External scorer processes.
pub mod scorer;
/// Async record store seam.
pub mod store;
