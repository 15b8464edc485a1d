//! Exemplar capture for histogram buckets.
//!
//! The `prometheus` crate keeps buckets but not exemplars, so each histogram
//! vector carries an [`ExemplarStore`]: for every series and every bucket
//! (including +Inf) the most recent exemplar that landed there.
//!
//! Stores travel with the collector registered for the vector. While a
//! registry is gathered under [`capture`], every histogram collected on that
//! thread hands over its store, so a scrape only ever sees the exemplars of
//! the registry it gathered.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;

use super::Labels;
use crate::error::{HistovecError, Result};

/// Upper bound on the combined length (in chars) of exemplar label names and
/// values, per OpenMetrics.
pub const EXEMPLAR_MAX_RUNES: usize = 128;

/// Sorted label pairs identifying one series (const labels included).
pub type SeriesKey = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Exemplar {
    /// Sorted by name.
    pub labels: Vec<(String, String)>,
    pub value: f64,
    pub timestamp: SystemTime,
}

impl Exemplar {
    /// Validate `labels` and stamp the exemplar with the current time.
    pub fn new(value: f64, labels: &Labels) -> Result<Self> {
        let mut runes = 0usize;
        let mut pairs = Vec::with_capacity(labels.len());
        for (name, v) in labels {
            if !is_valid_label_name(name) {
                return Err(HistovecError::InvalidExemplar(format!(
                    "invalid label name {name:?}"
                )));
            }
            runes += name.chars().count() + v.chars().count();
            pairs.push((name.clone(), v.clone()));
        }
        if runes > EXEMPLAR_MAX_RUNES {
            return Err(HistovecError::InvalidExemplar(format!(
                "labels have {runes} runes, exceeding the limit of {EXEMPLAR_MAX_RUNES}"
            )));
        }
        pairs.sort();
        Ok(Self {
            labels: pairs,
            value,
            timestamp: SystemTime::now(),
        })
    }
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Latest exemplar per (series, bucket) for one histogram vector.
#[derive(Debug)]
pub struct ExemplarStore {
    upper_bounds: Vec<f64>,
    label_names: Vec<String>,
    const_labels: Vec<(String, String)>,
    series: DashMap<SeriesKey, Vec<Option<Exemplar>>>,
}

impl ExemplarStore {
    pub(crate) fn new(upper_bounds: Vec<f64>, label_names: Vec<String>, const_labels: &Labels) -> Self {
        let const_labels = const_labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            upper_bounds,
            label_names,
            const_labels,
            series: DashMap::new(),
        }
    }

    /// Finite bucket bounds; the +Inf bucket sits at index `upper_bounds().len()`.
    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    /// Index of the bucket `v` falls into. NaN lands in +Inf.
    pub fn bucket_index(&self, v: f64) -> usize {
        self.upper_bounds
            .iter()
            .position(|&b| v <= b)
            .unwrap_or(self.upper_bounds.len())
    }

    /// Series key for the given variable label values, in the same sorted
    /// form the registry uses for label pairs.
    pub fn series_key(&self, label_values: &[&str]) -> SeriesKey {
        let mut key: SeriesKey = self.const_labels.clone();
        key.extend(
            self.label_names
                .iter()
                .zip(label_values)
                .map(|(k, v)| (k.clone(), (*v).to_string())),
        );
        key.sort();
        key
    }

    pub(crate) fn record(&self, label_values: &[&str], exemplar: Exemplar) {
        let idx = self.bucket_index(exemplar.value);
        let slots = self.upper_bounds.len() + 1;
        let mut entry = self
            .series
            .entry(self.series_key(label_values))
            .or_insert_with(|| vec![None; slots]);
        if let Some(slot) = entry.get_mut(idx) {
            *slot = Some(exemplar);
        }
    }

    /// Latest exemplar in `bucket` of the series identified by `key`.
    pub fn get(&self, key: &[(String, String)], bucket: usize) -> Option<Exemplar> {
        self.series
            .get(key)
            .and_then(|slots| slots.get(bucket).cloned().flatten())
    }

    /// Number of series that have at least one exemplar.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Exemplar stores gathered in one scrape, grouped by fully-qualified name.
///
/// A name can map to several stores when vectors differ only in const labels.
#[derive(Debug, Default)]
pub struct ExemplarSet {
    stores: HashMap<String, Vec<Arc<ExemplarStore>>>,
}

impl ExemplarSet {
    fn insert(&mut self, fq_name: &str, store: &Arc<ExemplarStore>) {
        self.stores
            .entry(fq_name.to_string())
            .or_default()
            .push(Arc::clone(store));
    }

    /// Latest exemplar in `bucket` of the series `key` of metric `fq_name`.
    pub fn get(&self, fq_name: &str, key: &[(String, String)], bucket: usize) -> Option<Exemplar> {
        self.stores
            .get(fq_name)?
            .iter()
            .find_map(|s| s.get(key, bucket))
    }

    /// Number of stores captured.
    pub fn len(&self) -> usize {
        self.stores.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

thread_local! {
    static CAPTURE: RefCell<Option<ExemplarSet>> = const { RefCell::new(None) };
}

/// Puts the enclosing capture back, also when the gather unwinds.
struct Restore(Option<ExemplarSet>);

impl Drop for Restore {
    fn drop(&mut self) {
        let outer = self.0.take();
        CAPTURE.with(|c| *c.borrow_mut() = outer);
    }
}

/// Run `f` (typically `Registry::gather`) and collect the stores offered by
/// histograms collected meanwhile on this thread.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, ExemplarSet) {
    let restore = Restore(CAPTURE.with(|c| c.replace(Some(ExemplarSet::default()))));
    let out = f();
    let set = CAPTURE.with(|c| c.borrow_mut().take()).unwrap_or_default();
    drop(restore);
    (out, set)
}

/// Hand `store` to the capture running on this thread, if any.
pub(crate) fn offer(fq_name: &str, store: &Arc<ExemplarStore>) {
    CAPTURE.with(|c| {
        if let Some(set) = c.borrow_mut().as_mut() {
            set.insert(fq_name, store);
        }
    });
}
