//! Dev server lifecycle: bind, serve until shutdown, then tear down.

use std::future::Future;

use tokio::net::TcpListener;

use histovec_core::error::{HistovecError, Result};
use histovec_core::{gate, shutdown};

use crate::{app_state::AppState, config::DevServerConfig, router};

/// Bind the configured address and serve until `signal` resolves, then run
/// the process-wide shutdown listeners.
///
/// Returns immediately when the server is disabled.
pub async fn run<F>(cfg: DevServerConfig, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if !cfg.enabled {
        tracing::info!("dev server disabled");
        return Ok(());
    }

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| HistovecError::Internal(format!("bind {addr} failed: {e}")))?;

    serve(listener, AppState::new(cfg), signal).await?;
    shutdown::fire();
    Ok(())
}

/// Serve on an already bound listener until `signal` resolves.
///
/// Turns the enablement gate on when metrics are exposed.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cfg = state.cfg();
    if cfg.enable_metrics {
        gate::enable();
    }
    if cfg.enable_pprof {
        tracing::warn!("enable_pprof set; no profiling endpoints are served");
    }

    let local = listener
        .local_addr()
        .map_err(|e| HistovecError::Internal(format!("local_addr: {e}")))?;
    tracing::info!(
        %local,
        health = %cfg.health_path,
        metrics = %cfg.metrics_path,
        open_metrics = cfg.enable_open_metrics,
        "dev server listening"
    );

    let app = router::build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| HistovecError::Internal(format!("server failed: {e}")))?;

    tracing::info!(%local, "dev server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler install failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler install failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
