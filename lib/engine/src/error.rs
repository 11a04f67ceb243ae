//! Error types for the engine crate.

use crate::store::StoreError;
use chairside_core::{ContactId, EnrollmentId};
use chairside_sequence::Category;
use std::fmt;

/// Errors from engine operations.
///
/// These surface per record; batch drivers log them, bump an error
/// counter, and move on to the next record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An enrollment references a contact that no longer exists.
    ContactMissing {
        enrollment_id: EnrollmentId,
        contact_id: ContactId,
    },
    /// An enrollment carries a category no policy is registered for.
    UnknownCategory { category: Category },
    /// Storage failure.
    Store(StoreError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContactMissing {
                enrollment_id,
                contact_id,
            } => {
                write!(
                    f,
                    "enrollment {enrollment_id} references missing contact {contact_id}"
                )
            }
            Self::UnknownCategory { category } => {
                write!(f, "no policy registered for category: {category}")
            }
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
