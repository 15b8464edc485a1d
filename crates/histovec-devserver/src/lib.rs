//! histovec dev server library entry.
//!
//! A small inner HTTP server exposing a health probe and the metrics scrape
//! endpoint for the process-wide registry. Used by the binary (`main.rs`) and
//! by integration tests.

pub mod app_state;
pub mod config;
pub mod ops;
pub mod router;
pub mod server;
