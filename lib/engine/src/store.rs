//! Storage collaborator traits.
//!
//! The engine issues point reads/writes and range scans against an
//! external relational store; these traits are the seam. Production
//! implementations live in the runner binary; tests use in-memory fakes.

use async_trait::async_trait;
use chairside_core::ContactId;
use chairside_sequence::{ApprovalAction, Category, Contact, Enrollment, StepDefinition};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A read failed.
    QueryFailed { reason: String },
    /// A write failed.
    WriteFailed { reason: String },
    /// A stored row could not be decoded.
    Decode { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { reason } => write!(f, "store query failed: {reason}"),
            Self::WriteFailed { reason } => write!(f, "store write failed: {reason}"),
            Self::Decode { reason } => write!(f, "failed to decode stored row: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Point reads of contacts.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Fetches a contact by ID.
    async fn get(&self, id: ContactId) -> Result<Option<Contact>, StoreError>;
}

/// Audience selection queries for the eligibility scanner, plus the
/// resolution probes the processor re-checks before each step.
///
/// Every selection query excludes contacts with the opt-out flag set.
#[async_trait]
pub trait AudienceSource: Send + Sync {
    /// Active patients whose last visit predates the cutoff, oldest first.
    async fn recall_candidates(
        &self,
        last_visit_before: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError>;

    /// Patients (any status) whose last visit predates the cutoff, oldest
    /// first.
    async fn lapsed_candidates(
        &self,
        last_visit_before: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError>;

    /// Contacts with a no-show on or after the given date that has not
    /// been followed up yet.
    async fn no_show_candidates(
        &self,
        on_or_after: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError>;

    /// Contacts with a treatment plan presented but not (fully) accepted.
    async fn open_treatment_plan_candidates(
        &self,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError>;

    /// Leads still in the new/contacted stage, oldest first.
    async fn unconverted_leads(&self, limit: i64) -> Result<Vec<Contact>, StoreError>;

    /// Whether the contact holds a scheduled, confirmed, or completed
    /// appointment on or after the given date.
    async fn has_upcoming_appointment(
        &self,
        contact_id: ContactId,
        on_or_after: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Flags the contact's recent no-shows as followed up, so the next
    /// scan does not pick them up again.
    async fn mark_no_show_followed_up(&self, contact_id: ContactId) -> Result<(), StoreError>;
}

/// Enrollment persistence.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Inserts the enrollment iff no active or paused enrollment exists
    /// for its (contact, category) pair. Returns whether a row was
    /// inserted.
    ///
    /// Implementations must make the conditional insert atomic (a partial
    /// unique index or equivalent); a separate lookup-then-insert races
    /// against concurrent scanners.
    async fn insert_if_no_open(&self, enrollment: &Enrollment) -> Result<bool, StoreError>;

    /// Claims active enrollments due at `now`, in ascending `next_send_at`
    /// order, capped at `limit`, leasing each claimed row until
    /// `now + lease`.
    ///
    /// Rows leased by another runner are skipped, so overlapping runs
    /// never double-process an enrollment. Leases expire on their own;
    /// a crashed runner releases nothing explicitly.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: chrono::Duration,
        limit: i64,
    ) -> Result<Vec<Enrollment>, StoreError>;

    /// Persists a mutated enrollment (step advance or terminal
    /// transition).
    async fn update(&self, enrollment: &Enrollment) -> Result<(), StoreError>;
}

/// Step definition lookup.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Finds the active definition for `(category, step_number)`.
    /// Inactive definitions are invisible.
    async fn find_active(
        &self,
        category: Category,
        step_number: u32,
    ) -> Result<Option<StepDefinition>, StoreError>;
}

/// The approval-queue boundary.
///
/// Actions are write-once; the engine never reads them back.
#[async_trait]
pub trait ApprovalQueue: Send + Sync {
    /// Queues a fully rendered action for human review.
    async fn push(&self, action: &ApprovalAction) -> Result<(), StoreError>;
}
