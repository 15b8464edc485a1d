//! Operational HTTP endpoints.
//!
//! - `<health_path>`  : liveness, body is the configured health response
//! - `<metrics_path>` : classic Prometheus text, or OpenMetrics with exemplars

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use histovec_core::exposition::{self, Format};

use crate::app_state::AppState;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.cfg().health_response.clone())
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let format = Format::from_open_metrics(state.cfg().enable_open_metrics);
    match exposition::render_registry(state.registry(), format) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, format.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.code().as_str()).into_response()
        }
    }
}
