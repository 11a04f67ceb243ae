//! Postgres repositories implementing the engine's storage traits.

mod action;
mod contact;
mod definition;
mod enrollment;
mod template;

pub use action::PgApprovalQueue;
pub use contact::PgContactStore;
pub use definition::PgDefinitionStore;
pub use enrollment::PgEnrollmentStore;
pub use template::PgTemplateStore;

use chairside_engine::StoreError;

pub(crate) fn query_failed(e: sqlx::Error) -> StoreError {
    StoreError::QueryFailed {
        reason: e.to_string(),
    }
}

pub(crate) fn write_failed(e: sqlx::Error) -> StoreError {
    StoreError::WriteFailed {
        reason: e.to_string(),
    }
}

pub(crate) fn decode_failed(e: impl std::fmt::Display) -> StoreError {
    StoreError::Decode {
        reason: e.to_string(),
    }
}
