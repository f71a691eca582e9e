//! Stored evaluation lookup

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub uid: i64,
    pub uid_foreign: i64,
    pub tablenames: String,
    pub url: String,
    pub results: Value,
    pub crdate: i64,
    pub tstamp: i64,
}

/// GET /api/evaluations/:table/:uid
pub async fn get_evaluation(
    State(state): State<AppState>,
    Path((table, uid)): Path<(String, i64)>,
) -> ApiResult<Json<EvaluationResponse>> {
    let evaluation = state
        .orchestrator
        .find_evaluation(uid, &table)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No evaluation for {}:{}", table, uid)))?;

    let results = evaluation.results_json()?;

    Ok(Json(EvaluationResponse {
        uid: evaluation.uid.unwrap_or_default(),
        uid_foreign: evaluation.uid_foreign,
        tablenames: evaluation.tablenames,
        url: evaluation.url,
        results,
        crdate: evaluation.crdate,
        tstamp: evaluation.tstamp,
    }))
}
