//! SEO evaluation of CMS content records
//!
//! Selects the records of a content table (and their translations), fetches
//! their rendered front-end pages, scores them against their focus keyword
//! and stores one evaluation per record.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod orchestrator;
pub mod schema;
pub mod scoring;
pub mod services;

pub use orchestrator::{EvaluationOrchestrator, SweepReport};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<EvaluationOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<EvaluationOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/ajax/evaluate", post(api::evaluate))
        .route("/api/evaluations/:table/:uid", get(api::get_evaluation))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
