//! Labeled histogram façade.
//!
//! [`HistogramVec`] is the capability set application code programs against;
//! [`PromHistogramVec`] is the `prometheus`-backed implementation. Every
//! observation goes through the process-wide [gate](crate::gate) first.

pub mod exemplar;
mod histogram;

use std::collections::HashMap;

use crate::error::Result;

pub use exemplar::{Exemplar, ExemplarSet, ExemplarStore};
pub use histogram::PromHistogramVec;

/// Label name/value mapping, as used by const labels and exemplars.
pub type Labels = HashMap<String, String>;

/// Exemplar label key carrying a trace id.
pub const EXEMPLAR_TRACE_KEY: &str = "traceID";

/// Construction parameters for a histogram vector.
///
/// Copied on construction; later changes to the caller's value have no effect
/// on the live metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramVecOpts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    /// Variable label names; every observation passes one value per name.
    pub labels: Vec<String>,
    /// Strictly increasing upper bounds. Empty selects the backend defaults.
    pub buckets: Vec<f64>,
    pub const_labels: Labels,
}

impl HistogramVecOpts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn buckets(mut self, buckets: impl Into<Vec<f64>>) -> Self {
        self.buckets = buckets.into();
        self
    }

    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }
}

/// A labeled histogram.
///
/// `labels` must carry exactly one value per declared label name; a mismatch
/// surfaces as [`HistovecError::LabelMismatch`](crate::HistovecError) while
/// the gate is on. While the gate is off every call is a successful no-op.
pub trait HistogramVec: Send + Sync {
    /// Observe an integer value.
    fn observe(&self, v: i64, labels: &[&str]) -> Result<()>;

    /// Observe a float value.
    fn observe_float(&self, v: f64, labels: &[&str]) -> Result<()>;

    /// Observe `v` and attach `exemplar` to the bucket it lands in.
    fn observe_with_exemplar(&self, v: f64, exemplar: &Labels, labels: &[&str]) -> Result<()>;

    /// Observe `v` with a `{traceID="<trace_id>"}` exemplar.
    fn observe_with_trace_exemplar(&self, v: f64, trace_id: &str, labels: &[&str]) -> Result<()> {
        let exemplar = Labels::from([(EXEMPLAR_TRACE_KEY.to_string(), trace_id.to_string())]);
        self.observe_with_exemplar(v, &exemplar, labels)
    }

    /// Unregister from the metrics registry.
    ///
    /// True on the first successful unregistration, false afterwards.
    fn close(&self) -> bool;
}
