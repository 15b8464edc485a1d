//! Shared state for the dev server handlers.

use std::sync::Arc;

use prometheus::Registry;

use crate::config::DevServerConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: DevServerConfig,
    registry: Registry,
}

impl AppState {
    /// State scraping the process-wide default registry.
    pub fn new(cfg: DevServerConfig) -> Self {
        Self::with_registry(cfg, prometheus::default_registry().clone())
    }

    pub fn with_registry(cfg: DevServerConfig, registry: Registry) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, registry }),
        }
    }

    pub fn cfg(&self) -> &DevServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }
}
