use std::net::Ipv6Addr;

use serde::Deserialize;
use histovec_core::error::{HistovecError, Result};

/// Inner HTTP server exposing health and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind host; empty binds every interface.
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Accepted for compatibility; this server has no profiling endpoints.
    #[serde(default = "default_true")]
    pub enable_pprof: bool,

    #[serde(default = "default_health_response")]
    pub health_response: String,

    /// Serve OpenMetrics text, which is what carries exemplars.
    #[serde(default)]
    pub enable_open_metrics: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::new(),
            port: default_port(),
            metrics_path: default_metrics_path(),
            health_path: default_health_path(),
            enable_metrics: true,
            enable_pprof: true,
            health_response: default_health_response(),
            enable_open_metrics: false,
        }
    }
}

impl DevServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(HistovecError::BadRequest("port must be non-zero".into()));
        }
        for (field, path) in [("metrics_path", &self.metrics_path), ("health_path", &self.health_path)] {
            if !path.starts_with('/') {
                return Err(HistovecError::BadRequest(format!(
                    "{field} must start with '/': {path:?}"
                )));
            }
        }
        self.validate_host()?;
        if self.enable_metrics && self.metrics_path == self.health_path {
            return Err(HistovecError::BadRequest(
                "metrics_path and health_path must differ".into(),
            ));
        }
        Ok(())
    }

    /// Hosts are bare: no port, no brackets, no whitespace. Anything with a
    /// colon must be an IPv6 literal.
    fn validate_host(&self) -> Result<()> {
        let h = self.host.as_str();
        let bad = |why: &str| HistovecError::BadRequest(format!("host {h:?}: {why}"));
        if h.chars().any(|c| c.is_whitespace() || c == '[' || c == ']' || c == '/') {
            return Err(bad("must be a bare hostname or IP literal"));
        }
        if h.contains(':') && h.parse::<Ipv6Addr>().is_err() {
            return Err(bad("not an IPv6 literal; set the port with `port`"));
        }
        Ok(())
    }

    /// `host:port`, with IPv6 hosts bracketed.
    pub fn listen_addr(&self) -> String {
        match self.host.as_str() {
            "" => format!("0.0.0.0:{}", self.port),
            h if h.contains(':') => format!("[{h}]:{}", self.port),
            h => format!("{h}:{}", self.port),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    6060
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_health_path() -> String {
    "/healthz".into()
}
fn default_health_response() -> String {
    "OK".into()
}
