//! Shared error type across histovec crates.

use thiserror::Error;

/// Stable error codes, independent of the backend's error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A metric with the same fully-qualified name is already registered.
    Conflict,
    /// Label value count differs from the declared label names.
    LabelMismatch,
    /// Exemplar labels rejected.
    InvalidExemplar,
    /// Any other metric construction or lookup failure.
    Metric,
    /// Invalid configuration.
    BadRequest,
    /// Internal failure (IO, encoding).
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and HTTP bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::LabelMismatch => "LABEL_MISMATCH",
            ErrorCode::InvalidExemplar => "INVALID_EXEMPLAR",
            ErrorCode::Metric => "METRIC",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, HistovecError>;

/// Unified error type used by core and devserver.
#[derive(Debug, Error)]
pub enum HistovecError {
    #[error("metric already registered: {0}")]
    Conflict(String),
    #[error("inconsistent label cardinality: expected {expect} label values, got {got}")]
    LabelMismatch { expect: usize, got: usize },
    #[error("invalid exemplar: {0}")]
    InvalidExemplar(String),
    #[error("metric: {0}")]
    Metric(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl HistovecError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            HistovecError::Conflict(_) => ErrorCode::Conflict,
            HistovecError::LabelMismatch { .. } => ErrorCode::LabelMismatch,
            HistovecError::InvalidExemplar(_) => ErrorCode::InvalidExemplar,
            HistovecError::Metric(_) => ErrorCode::Metric,
            HistovecError::BadRequest(_) => ErrorCode::BadRequest,
            HistovecError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<prometheus::Error> for HistovecError {
    fn from(e: prometheus::Error) -> Self {
        match e {
            prometheus::Error::AlreadyReg => {
                HistovecError::Conflict("duplicate collector registration".into())
            }
            prometheus::Error::InconsistentCardinality { expect, got } => {
                HistovecError::LabelMismatch { expect, got }
            }
            prometheus::Error::Io(e) => HistovecError::Internal(format!("io: {e}")),
            other => HistovecError::Metric(other.to_string()),
        }
    }
}
