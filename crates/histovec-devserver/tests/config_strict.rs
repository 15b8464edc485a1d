#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use histovec_devserver::config::{self, DevServerConfig};

#[test]
fn empty_document_uses_defaults() {
    let cfg = config::load_from_str("{}").expect("must parse");
    assert_eq!(cfg, DevServerConfig::default());
    assert!(cfg.enabled);
    assert_eq!(cfg.host, "");
    assert_eq!(cfg.port, 6060);
    assert_eq!(cfg.metrics_path, "/metrics");
    assert_eq!(cfg.health_path, "/healthz");
    assert!(cfg.enable_metrics);
    assert!(cfg.enable_pprof);
    assert_eq!(cfg.health_response, "OK");
    assert!(!cfg.enable_open_metrics);
    assert_eq!(cfg.listen_addr(), "0.0.0.0:6060");
}

#[test]
fn explicit_values_override_defaults() {
    let ok = r#"
host: "127.0.0.1"
port: 9100
metrics_path: "/prom"
health_path: "/live"
health_response: "alive"
enable_open_metrics: true
enable_pprof: false
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.listen_addr(), "127.0.0.1:9100");
    assert_eq!(cfg.metrics_path, "/prom");
    assert_eq!(cfg.health_response, "alive");
    assert!(cfg.enable_open_metrics);
    assert!(!cfg.enable_pprof);
}

#[test]
fn ipv6_host_is_bracketed() {
    let cfg = config::load_from_str("host: \"::1\"").unwrap();
    assert_eq!(cfg.listen_addr(), "[::1]:6060");
}

#[test]
fn deny_unknown_fields() {
    let bad = r#"
port: 6060
metric_path: "/metrics" # typo should fail
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn rejects_relative_paths_and_collisions() {
    let err = config::load_from_str("metrics_path: metrics").expect_err("relative");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");

    let err = config::load_from_str("health_path: /metrics").expect_err("collision");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");

    // Same path is fine when metrics are off.
    config::load_from_str("health_path: /metrics\nenable_metrics: false").unwrap();

    let err = config::load_from_str("port: 0").expect_err("port");
    assert_eq!(err.code().as_str(), "BAD_REQUEST");
}

#[test]
fn missing_file_is_internal() {
    let err = config::load_from_file("/nonexistent/histovec.yaml").expect_err("missing");
    assert_eq!(err.code().as_str(), "INTERNAL");
}

#[test]
fn comment_only_document_uses_defaults() {
    let cfg = config::load_from_str("# dev server\n---\n\n").unwrap();
    assert_eq!(cfg, DevServerConfig::default());
}

#[test]
fn no_path_loads_defaults() {
    assert_eq!(config::load(None).unwrap(), DevServerConfig::default());
    let err = config::load(Some("/nonexistent/histovec.yaml")).expect_err("missing");
    assert_eq!(err.code().as_str(), "INTERNAL");
}

#[test]
fn host_must_be_bare() {
    for bad in ["\"[::1]\"", "\"127.0.0.1:8080\"", "\"local host\"", "\"::zz\""] {
        let err = config::load_from_str(&format!("host: {bad}")).expect_err(bad);
        assert_eq!(err.code().as_str(), "BAD_REQUEST", "{bad}");
    }
    for ok in ["localhost", "\"10.0.0.1\"", "\"fe80::1\""] {
        config::load_from_str(&format!("host: {ok}")).unwrap();
    }
}
