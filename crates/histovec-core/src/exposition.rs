//! Scrape exposition.
//!
//! Classic Prometheus text is produced by `prometheus::TextEncoder`. The
//! OpenMetrics rendering is done here because it is the only format that can
//! carry exemplars, and the backend does not know about them. Exemplars come
//! from the [`ExemplarSet`] captured while the registry was gathered.

use std::fmt::Write;
use std::time::UNIX_EPOCH;

use prometheus::proto::{LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, Registry, TextEncoder};

use crate::error::{HistovecError, Result};
use crate::metric::exemplar::{self, Exemplar, ExemplarSet, SeriesKey};

/// Content type of the OpenMetrics text format.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Content type of the classic text format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Prometheus text format 0.0.4.
    Text,
    /// OpenMetrics 1.0 text, with exemplars.
    OpenMetrics,
}

impl Format {
    pub fn from_open_metrics(enabled: bool) -> Self {
        if enabled {
            Format::OpenMetrics
        } else {
            Format::Text
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Text => TEXT_CONTENT_TYPE,
            Format::OpenMetrics => OPENMETRICS_CONTENT_TYPE,
        }
    }
}

/// Gather `registry` along with the exemplars of the histograms it holds.
pub fn gather(registry: &Registry) -> (Vec<MetricFamily>, ExemplarSet) {
    exemplar::capture(|| registry.gather())
}

/// Gather `registry` and render it.
pub fn render_registry(registry: &Registry, format: Format) -> Result<String> {
    let (families, exemplars) = gather(registry);
    render_with_exemplars(&families, &exemplars, format)
}

/// Render already gathered families, without exemplars.
pub fn render(families: &[MetricFamily], format: Format) -> Result<String> {
    render_with_exemplars(families, &ExemplarSet::default(), format)
}

/// Render gathered families; `exemplars` only matters for OpenMetrics.
pub fn render_with_exemplars(
    families: &[MetricFamily],
    exemplars: &ExemplarSet,
    format: Format,
) -> Result<String> {
    match format {
        Format::Text => {
            let mut buf = Vec::new();
            TextEncoder::new().encode(families, &mut buf)?;
            String::from_utf8(buf).map_err(|e| HistovecError::Internal(format!("utf8: {e}")))
        }
        Format::OpenMetrics => {
            let mut out = String::new();
            for mf in families {
                encode_family(mf, exemplars, &mut out);
            }
            out.push_str("# EOF\n");
            Ok(out)
        }
    }
}

fn encode_family(mf: &MetricFamily, exemplars: &ExemplarSet, out: &mut String) {
    let name = mf.get_name();
    match mf.get_field_type() {
        MetricType::COUNTER => {
            let family = name.strip_suffix("_total").unwrap_or(name);
            write_header(out, family, mf.get_help(), "counter");
            let sample = format!("{family}_total");
            for m in mf.get_metric() {
                write_sample(out, &sample, m.get_label(), None, &fmt_float(m.get_counter().get_value()));
                out.push('\n');
            }
        }
        MetricType::GAUGE => {
            write_header(out, name, mf.get_help(), "gauge");
            for m in mf.get_metric() {
                write_sample(out, name, m.get_label(), None, &fmt_float(m.get_gauge().get_value()));
                out.push('\n');
            }
        }
        MetricType::UNTYPED => {
            write_header(out, name, mf.get_help(), "unknown");
            for m in mf.get_metric() {
                write_sample(out, name, m.get_label(), None, &fmt_float(m.get_untyped().get_value()));
                out.push('\n');
            }
        }
        MetricType::SUMMARY => {
            write_header(out, name, mf.get_help(), "summary");
            for m in mf.get_metric() {
                let s = m.get_summary();
                for q in s.get_quantile() {
                    let quantile = fmt_float(q.get_quantile());
                    write_sample(out, name, m.get_label(), Some(("quantile", &quantile)), &fmt_float(q.get_value()));
                    out.push('\n');
                }
                write_sample(out, &format!("{name}_sum"), m.get_label(), None, &fmt_float(s.get_sample_sum()));
                out.push('\n');
                write_sample(out, &format!("{name}_count"), m.get_label(), None, &s.get_sample_count().to_string());
                out.push('\n');
            }
        }
        MetricType::HISTOGRAM => {
            write_header(out, name, mf.get_help(), "histogram");
            for m in mf.get_metric() {
                encode_histogram(out, name, m, exemplars);
            }
        }
    }
}

fn encode_histogram(out: &mut String, name: &str, m: &Metric, exemplars: &ExemplarSet) {
    let h = m.get_histogram();
    let key: SeriesKey = m
        .get_label()
        .iter()
        .map(|lp| (lp.get_name().to_string(), lp.get_value().to_string()))
        .collect();
    let bucket_name = format!("{name}_bucket");

    let mut inf_seen = false;
    let buckets = h.get_bucket();
    for (i, b) in buckets.iter().enumerate() {
        let le = fmt_float(b.get_upper_bound());
        write_sample(out, &bucket_name, m.get_label(), Some(("le", &le)), &b.get_cumulative_count().to_string());
        write_exemplar(out, exemplars.get(name, &key, i).as_ref());
        out.push('\n');
        if b.get_upper_bound() == f64::INFINITY {
            inf_seen = true;
        }
    }
    if !inf_seen {
        write_sample(out, &bucket_name, m.get_label(), Some(("le", "+Inf")), &h.get_sample_count().to_string());
        write_exemplar(out, exemplars.get(name, &key, buckets.len()).as_ref());
        out.push('\n');
    }

    write_sample(out, &format!("{name}_sum"), m.get_label(), None, &fmt_float(h.get_sample_sum()));
    out.push('\n');
    write_sample(out, &format!("{name}_count"), m.get_label(), None, &h.get_sample_count().to_string());
    out.push('\n');
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    if !help.is_empty() {
        let _ = writeln!(out, "# HELP {} {}", name, escape(help));
    }
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn write_sample(
    out: &mut String,
    name: &str,
    labels: &[LabelPair],
    extra: Option<(&str, &str)>,
    value: &str,
) {
    out.push_str(name);
    let mut pairs: Vec<(&str, &str)> = labels.iter().map(|lp| (lp.get_name(), lp.get_value())).collect();
    if let Some(e) = extra {
        pairs.push(e);
    }
    write_label_set(out, &pairs);
    out.push(' ');
    out.push_str(value);
}

fn write_exemplar(out: &mut String, exemplar: Option<&Exemplar>) {
    let Some(e) = exemplar else { return; };
    let pairs: Vec<(&str, &str)> = e.labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    out.push_str(" # ");
    if pairs.is_empty() {
        out.push_str("{}");
    } else {
        write_label_set(out, &pairs);
    }
    let ts = e.timestamp.duration_since(UNIX_EPOCH).unwrap_or_default();
    let _ = write!(out, " {} {}.{:03}", fmt_float(e.value), ts.as_secs(), ts.subsec_millis());
}

fn write_label_set(out: &mut String, pairs: &[(&str, &str)]) {
    if pairs.is_empty() {
        return;
    }
    out.push('{');
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}=\"{}\"", k, escape(v));
    }
    out.push('}');
}

/// Escape label values and help text.
fn escape(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// OpenMetrics float: integral values keep a `.0`, infinities are `±Inf`.
fn fmt_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let inf = if v > 0.0 { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}
