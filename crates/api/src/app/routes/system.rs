use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Process-wide orchestrator counters, summed over every tenant.
///
/// Operator endpoint: it sits outside the tenant middleware and must only be
/// reachable from the internal network, never through the public gateway.
/// The body carries aggregate counts and nothing tenant-identifying.
pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.orchestrator.stats())
}
