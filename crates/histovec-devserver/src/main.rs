//! histovec dev server.
//!
//! Usage: `histovec-devserver [config.yaml]`. Without a path the defaults
//! apply (port 6060, `/metrics`, `/healthz`).

use tracing_subscriber::{fmt, EnvFilter};

use histovec_devserver::{config, server};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1);
    let cfg = match config::load(path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "config load failed");
            std::process::exit(2);
        }
    };

    tracing::info!(addr = %cfg.listen_addr(), "histovec-devserver starting");
    if let Err(e) = server::run(cfg, server::shutdown_signal()).await {
        tracing::error!(error = %e, code = e.code().as_str(), "dev server failed");
        std::process::exit(1);
    }
}
