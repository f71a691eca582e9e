//! Ajax evaluation trigger
//!
//! `POST /ajax/evaluate` accepts `{uid, table?}` as JSON or as form
//! variables. Only a request without a body is served from the query string.
//! The response is the HTML fragment of the sweep's diagnostics.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Query, Request, State},
    http::{header, HeaderMap, Method},
    response::Html,
    Form, Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    /// Number or numeric string; anything else means "all records"
    #[serde(default)]
    pub uid: Option<Value>,
    #[serde(default)]
    pub table: Option<String>,
}

impl EvaluateRequest {
    fn from_query(params: &HashMap<String, String>) -> Self {
        Self {
            uid: params.get("uid").map(|v| Value::String(v.clone())),
            table: params.get("table").cloned(),
        }
    }

    /// Target uid, 0 when missing or unparsable
    pub fn target_uid(&self) -> i64 {
        match &self.uid {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn target_table(&self) -> &str {
        self.table.as_deref().unwrap_or("")
    }
}

/// Decode the request from its body, or from the query string if the body is empty
pub async fn read_request(
    headers: &HeaderMap,
    body: Bytes,
    params: &HashMap<String, String>,
) -> ApiResult<EvaluateRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EvaluateRequest::from_query(params));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let request = Request::builder()
            .method(Method::POST)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let Form(parsed) = Form::<EvaluateRequest>::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok(parsed);
    }

    let Json(parsed) =
        Json::<EvaluateRequest>::from_bytes(&body).map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(parsed)
}

/// POST /ajax/evaluate
pub async fn evaluate(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Html<String>> {
    let request = read_request(&headers, body, &params).await?;

    let report = state
        .orchestrator
        .evaluate(request.target_table(), request.target_uid())
        .await?;

    info!(
        sweep_id = %report.sweep_id,
        evaluated = report.evaluated.len(),
        "Ajax evaluation finished"
    );

    Ok(Html(report.diagnostics.render_html()))
}
