//! histovec: labeled Prometheus histograms behind a process-wide switch.
//!
//! Application code builds a [`PromHistogramVec`] and observes through the
//! [`HistogramVec`] trait; nothing is recorded until [`gate::enable`] runs,
//! which the dev server does when it exposes metrics. Live vectors are
//! unregistered by [`shutdown::fire`] or when their last handle drops.

pub use histovec_core::{gate, shutdown, HistogramVec, HistogramVecOpts, PromHistogramVec};

/// Error type, exposition and exemplar types.
pub mod core {
    pub use histovec_core::*;
}

/// Health and metrics HTTP server.
pub mod devserver {
    pub use histovec_devserver::*;
}
