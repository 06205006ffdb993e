//! Errors reported at the engine boundary.
//!
//! Rejected throws are not errors; they travel as `ThrowRejection` inside
//! the return path.

use std::fmt;

use crate::types::{CardId, VisualHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed coordinates, timestamps or handles passed to an operation.
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
    /// The card already has a live entity.
    AlreadyTracked(CardId),
    /// The visual proxy is owned by another active card.
    VisualInUse(VisualHandle),
    /// Configuration values are inconsistent.
    InvalidConfig(String),
    /// Configuration text could not be parsed.
    ConfigParse(String),
}

impl EngineError {
    pub fn invalid_input(field: &'static str, reason: &'static str) -> Self {
        EngineError::InvalidInput { field, reason }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidInput { field, reason } => {
                write!(f, "invalid input `{field}`: {reason}")
            }
            EngineError::AlreadyTracked(id) => write!(f, "card {id} is already being tracked"),
            EngineError::VisualInUse(handle) => {
                write!(f, "{handle} is owned by another active card")
            }
            EngineError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            EngineError::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ConfigParse(err.to_string())
    }
}
