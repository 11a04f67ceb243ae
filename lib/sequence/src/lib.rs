//! Outreach sequence domain model for the chairside platform.
//!
//! This crate defines the entities the sequencing engine moves between:
//! contacts, campaign categories, step definitions, enrollments (with
//! their explicit state machine), and the approval-queue actions the
//! engine emits.

pub mod action;
pub mod category;
pub mod contact;
pub mod enrollment;
pub mod error;
pub mod step;

pub use action::ApprovalAction;
pub use category::{Category, DelayUnit, InquiryKind};
pub use contact::{Contact, LeadStatus};
pub use enrollment::{Enrollment, EnrollmentStatus, TerminalStatus};
pub use error::UnknownValueError;
pub use step::{Channel, StepDefinition};
