//! Error types for the content crate.
//!
//! - `TemplateError`: template lookup failures
//! - `GenerationError`: text-generation collaborator failures
//!
//! Both are always survivable: the resolver degrades to the next link of
//! its fallback chain rather than failing the step.

use std::fmt;

/// Errors from template storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The lookup itself failed (storage unreachable, decode error).
    LookupFailed { reason: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed { reason } => {
                write!(f, "template lookup failed: {reason}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Errors from the text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No generator is configured or the provider is unreachable.
    Unavailable { reason: String },
    /// The request was sent but failed.
    RequestFailed { reason: String },
    /// Timeout waiting for a response.
    Timeout,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "text generation unavailable: {reason}")
            }
            Self::RequestFailed { reason } => {
                write!(f, "text generation request failed: {reason}")
            }
            Self::Timeout => write!(f, "text generation timed out"),
        }
    }
}

impl std::error::Error for GenerationError {}
