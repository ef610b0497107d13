//! HTTP transport: a thin adapter over the query service.
//!
//! The response envelope's `errorCode` doubles as the HTTP status, so the
//! body and status can never disagree.
//!
//! # Routes
//!
//! - `GET /health`: liveness
//! - `GET /v1/labels/count`: distinct healed hashes
//! - `GET /v1/heal/{labelhash}`: heal a digest; optional `labelSetId` /
//!   `labelSetVersion` query parameters pin the answer to a snapshot
//! - `GET /v1/version`: server and store version info

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::error;

use rainbow_service::{CountResponse, HealResponse, HealthResponse, QueryService};

pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/labels/count", get(count))
        .route("/v1/heal/:labelhash", get(heal))
        .route("/v1/version", get(version))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct HealParams {
    #[serde(rename = "labelSetId")]
    label_set_id: Option<String>,
    #[serde(rename = "labelSetVersion")]
    label_set_version: Option<String>,
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn health(State(service): State<Arc<QueryService>>) -> Json<HealthResponse> {
    Json(service.health_check())
}

async fn count(State(service): State<Arc<QueryService>>) -> (StatusCode, Json<CountResponse>) {
    let response = service.label_count();
    (status_from(response.error_code()), Json(response))
}

async fn heal(
    State(service): State<Arc<QueryService>>,
    Path(labelhash): Path<String>,
    Query(params): Query<HealParams>,
) -> (StatusCode, Json<HealResponse>) {
    let response = service.heal(
        &labelhash,
        params.label_set_id.as_deref(),
        params.label_set_version.as_deref(),
    );
    (status_from(response.error_code()), Json(response))
}

async fn version(
    State(service): State<Arc<QueryService>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match service.version() {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(value) => (StatusCode::OK, Json(value)),
            Err(e) => {
                error!(error = %e, "version serialization failed");
                internal_error()
            }
        },
        Err(e) => {
            error!(error = %e, "version lookup failed");
            internal_error()
        }
    }
}

fn internal_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "status": "error",
            "error": "Internal server error",
            "errorCode": 503,
        })),
    )
}
