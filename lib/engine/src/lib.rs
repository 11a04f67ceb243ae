//! Engagement sequencing engine for the chairside platform.
//!
//! Three drivers make up the engine: the [`EligibilityScanner`] selects
//! contacts and enrolls them, the [`EnrollmentService`] creates at most
//! one open enrollment per (contact, category), and the
//! [`DueStepProcessor`] advances due enrollments through terminal
//! checks, content resolution, approval queuing, and the step
//! transition. Per-category business rules live in the [`policy`]
//! registry; storage is behind the [`store`] traits.
//!
//! The engine is invoked as a library by a periodic job. It never sends
//! anything: its only output is approval-queue actions for human review.

pub mod enroll;
pub mod error;
pub mod policy;
pub mod processor;
pub mod scan;
pub mod store;

pub use enroll::{EnrollOutcome, EnrollmentService};
pub use error::EngineError;
pub use policy::{CategoryPolicy, CategoryRegistry};
pub use processor::{DueStepProcessor, ProcessReport, ProcessorConfig};
pub use scan::{CategoryScan, EligibilityScanner, ScanConfig, ScanReport};
pub use store::{
    ApprovalQueue, AudienceSource, ContactStore, DefinitionStore, EnrollmentStore, StoreError,
};
