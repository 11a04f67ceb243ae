//! Sequence enrollments and their state machine.
//!
//! An enrollment tracks one contact's progress through one category's
//! sequence. `active` is the only state the processor advances from;
//! `paused` is set and cleared manually by staff; everything else is
//! terminal and retained for audit. No transition is defined out of a
//! terminal state: stale triggers replaying a terminal enrollment are
//! no-ops, never errors.

use crate::category::Category;
use crate::error::UnknownValueError;
use chairside_core::{ContactId, EnrollmentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a sequence enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// In flight; the processor advances these.
    Active,
    /// Manually held by staff; skipped, never advanced or errored.
    Paused,
    /// Ran out of steps.
    Completed,
    /// The lead converted or booked before the sequence finished.
    Converted,
    /// The contact opted out of outreach.
    OptedOut,
    /// The patient booked again before the sequence finished.
    Reactivated,
}

impl EnrollmentStatus {
    /// Returns true if the engine will never advance this enrollment again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Converted | Self::OptedOut | Self::Reactivated
        )
    }

    /// Returns the stable wire string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Converted => "converted",
            Self::OptedOut => "opted_out",
            Self::Reactivated => "reactivated",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "converted" => Ok(Self::Converted),
            "opted_out" => Ok(Self::OptedOut),
            "reactivated" => Ok(Self::Reactivated),
            _ => Err(UnknownValueError::new("enrollment status", s)),
        }
    }
}

/// The subset of statuses an enrollment can finish in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Completed,
    Converted,
    OptedOut,
    Reactivated,
}

impl From<TerminalStatus> for EnrollmentStatus {
    fn from(terminal: TerminalStatus) -> Self {
        match terminal {
            TerminalStatus::Completed => Self::Completed,
            TerminalStatus::Converted => Self::Converted,
            TerminalStatus::OptedOut => Self::OptedOut,
            TerminalStatus::Reactivated => Self::Reactivated,
        }
    }
}

/// One contact's progress through one category's sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier.
    pub id: EnrollmentId,
    /// The enrolled contact.
    pub contact_id: ContactId,
    /// The sequence being walked.
    pub category: Category,
    /// Current step number, starting at 1. Strictly increases.
    pub current_step: u32,
    /// Current status.
    pub status: EnrollmentStatus,
    /// When the current step becomes due.
    pub next_send_at: DateTime<Utc>,
    /// When a step was last queued for approval.
    pub last_sent_at: Option<DateTime<Utc>>,
    /// When the enrollment reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the enrollment was created.
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    /// Creates an active enrollment at step 1, due after the first step's
    /// delay.
    #[must_use]
    pub fn new(
        contact_id: ContactId,
        category: Category,
        first_delay: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EnrollmentId::new(),
            contact_id,
            category,
            current_step: 1,
            status: EnrollmentStatus::Active,
            next_send_at: now + first_delay,
            last_sent_at: None,
            completed_at: None,
            created_at: now,
        }
    }

    /// Returns true while the enrollment holds its (contact, category) slot.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            EnrollmentStatus::Active | EnrollmentStatus::Paused
        )
    }

    /// Returns true when the current step is ready to process.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == EnrollmentStatus::Active && self.next_send_at <= now
    }

    /// Moves to the next step after the current one was queued.
    ///
    /// Only an active enrollment advances; anything else is a no-op.
    pub fn advance(&mut self, next_delay: chrono::Duration, now: DateTime<Utc>) {
        if self.status != EnrollmentStatus::Active {
            return;
        }
        self.current_step += 1;
        self.last_sent_at = Some(now);
        self.next_send_at = now + next_delay;
    }

    /// Stamps the send time without advancing, for the final step of a
    /// sequence (queued, then finished).
    pub fn record_send(&mut self, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.last_sent_at = Some(now);
    }

    /// Finishes the enrollment in the given terminal status.
    ///
    /// A no-op when the enrollment is already terminal.
    pub fn finish(&mut self, terminal: TerminalStatus, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = terminal.into();
        self.completed_at = Some(now);
    }
}
