//! Error types shared across LearnAI crates.
//!
//! `ApiError` is defined here rather than in `learnai-client` so the wizard
//! engine can downcast and phrase failures without string matching.

use thiserror::Error;

/// Errors that can occur when talking to the remote LearnAI API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("{detail} (HTTP {status})")]
    Status { status: u16, detail: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The API could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns the HTTP status, if the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures of the durable key-value storage backing the score store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage is disabled or otherwise not usable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The value would exceed the configured per-value quota.
    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    /// Stored data could not be parsed.
    #[error("corrupt stored value for '{key}': {message}")]
    Corrupt { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Grading precondition violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GradeError {
    #[error("cannot grade a quiz with no answers")]
    EmptyQuiz,
}
