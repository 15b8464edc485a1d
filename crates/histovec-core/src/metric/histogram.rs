use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Histogram, HistogramOpts, Registry};

use super::exemplar::{self, Exemplar, ExemplarStore};
use super::{HistogramVec, HistogramVecOpts, Labels};
use crate::error::{HistovecError, Result};
use crate::gate;
use crate::shutdown::{self, ListenerId};

/// Histogram vector backed by a `prometheus::HistogramVec`.
///
/// Cloning is cheap and yields another handle to the same metric. When the
/// last handle is dropped the metric is unregistered.
#[derive(Clone)]
pub struct PromHistogramVec {
    inner: Arc<Inner>,
}

struct Inner {
    collector: VecCollector,
    registry: Registry,
    listener: OnceLock<ListenerId>,
    closed: AtomicBool,
}

/// What the registry holds: the backend vector plus its exemplar store,
/// offered to whichever scrape collects it.
#[derive(Clone)]
struct VecCollector {
    histogram: prometheus::HistogramVec,
    fq_name: String,
    exemplars: Arc<ExemplarStore>,
}

impl Collector for VecCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.histogram.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        exemplar::offer(&self.fq_name, &self.exemplars);
        self.histogram.collect()
    }
}

impl PromHistogramVec {
    /// Build and register a histogram vector in the default registry.
    ///
    /// `None` yields `None` without touching any registry.
    ///
    /// # Panics
    /// If registration fails, e.g. a metric with the same fully-qualified
    /// name is already registered, or the options are rejected by the
    /// backend. Use [`try_new`](Self::try_new) to handle those as errors.
    #[allow(clippy::panic)]
    pub fn new(opts: Option<&HistogramVecOpts>) -> Option<Self> {
        let opts = opts?;
        match Self::try_new(opts) {
            Ok(hv) => Some(hv),
            Err(e) => panic!("histogram {:?} registration failed: {e}", opts.name),
        }
    }

    /// Build and register a histogram vector in the default registry.
    pub fn try_new(opts: &HistogramVecOpts) -> Result<Self> {
        Self::try_new_in(prometheus::default_registry(), opts)
    }

    /// Build and register a histogram vector in `registry`.
    pub fn try_new_in(registry: &Registry, opts: &HistogramVecOpts) -> Result<Self> {
        let hopts = HistogramOpts::new(opts.name.clone(), opts.help.clone())
            .namespace(opts.namespace.clone())
            .subsystem(opts.subsystem.clone())
            .const_labels(opts.const_labels.clone())
            .buckets(opts.buckets.clone());
        let label_names: Vec<&str> = opts.labels.iter().map(String::as_str).collect();
        let histogram = prometheus::HistogramVec::new(hopts, &label_names)?;

        let fq_name = histogram
            .desc()
            .first()
            .map(|d| d.fq_name.clone())
            .unwrap_or_else(|| opts.name.clone());

        let collector = VecCollector {
            histogram,
            exemplars: Arc::new(ExemplarStore::new(
                effective_buckets(&opts.buckets),
                opts.labels.clone(),
                &opts.const_labels,
            )),
            fq_name,
        };
        registry
            .register(Box::new(collector.clone()))
            .map_err(|e| match e {
                prometheus::Error::AlreadyReg => {
                    HistovecError::Conflict(collector.fq_name.clone())
                }
                other => other.into(),
            })?;

        let inner = Arc::new(Inner {
            collector,
            registry: registry.clone(),
            listener: OnceLock::new(),
            closed: AtomicBool::new(false),
        });

        // The listener only looks the handle up; it never keeps it alive.
        let weak = Arc::downgrade(&inner);
        let id = shutdown::add_shutdown_listener(move || {
            if let Some(inner) = weak.upgrade() {
                inner.close();
            }
        });
        let _ = inner.listener.set(id);

        tracing::debug!(metric = %inner.collector.fq_name, "histogram registered");
        Ok(Self { inner })
    }

    /// Fully-qualified metric name (`namespace_subsystem_name`).
    pub fn fq_name(&self) -> &str {
        &self.inner.collector.fq_name
    }

    /// Exemplars captured by this vector.
    pub fn exemplars(&self) -> &ExemplarStore {
        &self.inner.collector.exemplars
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn child(&self, labels: &[&str]) -> Result<Histogram> {
        Ok(self.inner.collector.histogram.get_metric_with_label_values(labels)?)
    }
}

impl HistogramVec for PromHistogramVec {
    fn observe(&self, v: i64, labels: &[&str]) -> Result<()> {
        gate::update(|| {
            self.child(labels)?.observe(v as f64);
            Ok(())
        })
    }

    fn observe_float(&self, v: f64, labels: &[&str]) -> Result<()> {
        gate::update(|| {
            self.child(labels)?.observe(v);
            Ok(())
        })
    }

    fn observe_with_exemplar(&self, v: f64, exemplar: &Labels, labels: &[&str]) -> Result<()> {
        gate::update(|| {
            // Validate first so a rejected exemplar leaves no empty series.
            let exemplar = Exemplar::new(v, exemplar)?;
            self.child(labels)?.observe(v);
            self.inner.collector.exemplars.record(labels, exemplar);
            Ok(())
        })
    }

    fn close(&self) -> bool {
        self.inner.close()
    }
}

impl Collector for PromHistogramVec {
    fn desc(&self) -> Vec<&Desc> {
        self.inner.collector.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.inner.collector.collect()
    }
}

impl Inner {
    fn close(&self) -> bool {
        // Once per handle: a later close must not unregister a newer metric
        // that reused the same name.
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(id) = self.listener.get() {
            shutdown::remove_shutdown_listener(*id);
        }
        let fq_name = &self.collector.fq_name;
        match self.registry.unregister(Box::new(self.collector.clone())) {
            Ok(()) => {
                tracing::debug!(metric = %fq_name, "histogram unregistered");
                true
            }
            Err(e) => {
                tracing::debug!(metric = %fq_name, error = %e, "histogram unregister failed");
                false
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bucket bounds as the backend ends up using them: defaults when empty,
/// trailing +Inf dropped.
fn effective_buckets(buckets: &[f64]) -> Vec<f64> {
    let mut out = if buckets.is_empty() {
        prometheus::DEFAULT_BUCKETS.to_vec()
    } else {
        buckets.to_vec()
    };
    if out.last().is_some_and(|b| b.is_infinite() && b.is_sign_positive()) {
        out.pop();
    }
    out
}
