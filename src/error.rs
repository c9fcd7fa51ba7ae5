//! Error taxonomy for the chapter pipeline
//!
//! Only structural violations are errors. An ambiguity that cannot be
//! resolved is recovered locally and reported as a
//! [`Diagnostic`](crate::scanner::disambiguate::Diagnostic) instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeaveError {
    #[error("malformed candidate for '{entity_id}': start {start} >= end {end}")]
    MalformedCandidate {
        entity_id: String,
        start: usize,
        end: usize,
    },

    #[error("candidate for '{entity_id}' ends at {end}, document has {token_count} tokens")]
    CandidateOutOfBounds {
        entity_id: String,
        end: usize,
        token_count: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid context rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("malformed chunk {index}: {reason}")]
    MalformedChunk { index: usize, reason: String },
}

impl From<serde_json::Error> for WeaveError {
    fn from(e: serde_json::Error) -> Self {
        WeaveError::InvalidConfig(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WeaveError>;
