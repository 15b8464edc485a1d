//! histovec core: labeled histogram façade, enablement gate, shutdown registry.
//!
//! Storage and classic exposition are delegated to the `prometheus` crate.
//! This crate carries no async runtime so it can be linked into any process
//! that wants gated, registry-backed histograms.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. The only deliberate
//! panic is the fail-fast constructor [`metric::PromHistogramVec::new`], which
//! mirrors `prometheus`' must-register convention.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod gate;
pub mod metric;
pub mod shutdown;

/// Shared result type.
pub use error::{HistovecError, Result};
pub use metric::{HistogramVec, HistogramVecOpts, PromHistogramVec};
