//! Axum router wiring for the configured health and metrics paths.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    let cfg = state.cfg();
    let mut router = Router::new().route(&cfg.health_path, get(ops::healthz));
    if cfg.enable_metrics {
        router = router.route(&cfg.metrics_path, get(ops::metrics));
    }
    router.with_state(state)
}
