//! Idempotent enrollment of contacts into sequences.

use crate::error::EngineError;
use crate::store::{DefinitionStore, EnrollmentStore};
use chairside_core::Clock;
use chairside_sequence::{Category, Contact, Enrollment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of an enrollment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollOutcome {
    /// A new enrollment was created at step 1.
    Created,
    /// The contact already holds an active or paused enrollment for the
    /// category.
    AlreadyEnrolled,
    /// The category has no active step-1 definition; nothing to enroll
    /// into.
    NoStepDefinition,
}

impl EnrollOutcome {
    /// Returns true when a new enrollment was created.
    #[must_use]
    pub fn created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Creates sequence enrollments, at most one open per (contact, category).
pub struct EnrollmentService {
    clock: Arc<dyn Clock>,
    definitions: Arc<dyn DefinitionStore>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl EnrollmentService {
    /// Creates an enrollment service.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        definitions: Arc<dyn DefinitionStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            clock,
            definitions,
            enrollments,
        }
    }

    /// Enrolls the contact into the category's sequence, if not already in
    /// it.
    ///
    /// The first step becomes due after its own delay, counted from now.
    /// Uniqueness is enforced by the store's atomic conditional insert,
    /// not by a prior lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub async fn enroll(
        &self,
        contact: &Contact,
        category: Category,
    ) -> Result<EnrollOutcome, EngineError> {
        let Some(first_step) = self.definitions.find_active(category, 1).await? else {
            return Ok(EnrollOutcome::NoStepDefinition);
        };

        let now = self.clock.now();
        let enrollment = Enrollment::new(contact.id, category, first_step.delay_duration(), now);

        if self.enrollments.insert_if_no_open(&enrollment).await? {
            tracing::debug!(
                contact = %contact.id,
                category = %category,
                next_send_at = %enrollment.next_send_at,
                "enrolled contact"
            );
            Ok(EnrollOutcome::Created)
        } else {
            Ok(EnrollOutcome::AlreadyEnrolled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use chairside_core::ManualClock;
    use chairside_sequence::{Channel, InquiryKind, StepDefinition, TerminalStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    struct FixedDefinitions {
        definitions: Vec<StepDefinition>,
    }

    #[async_trait]
    impl DefinitionStore for FixedDefinitions {
        async fn find_active(
            &self,
            category: Category,
            step_number: u32,
        ) -> Result<Option<StepDefinition>, StoreError> {
            Ok(self
                .definitions
                .iter()
                .find(|d| d.category == category && d.step_number == step_number && d.active)
                .cloned())
        }
    }

    #[derive(Default)]
    struct MemoryEnrollments {
        rows: Mutex<Vec<Enrollment>>,
    }

    #[async_trait]
    impl EnrollmentStore for MemoryEnrollments {
        async fn insert_if_no_open(&self, enrollment: &Enrollment) -> Result<bool, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let taken = rows.iter().any(|e| {
                e.contact_id == enrollment.contact_id
                    && e.category == enrollment.category
                    && e.is_open()
            });
            if taken {
                return Ok(false);
            }
            rows.push(enrollment.clone());
            Ok(true)
        }

        async fn claim_due(
            &self,
            _now: DateTime<Utc>,
            _lease: chrono::Duration,
            _limit: i64,
        ) -> Result<Vec<Enrollment>, StoreError> {
            Ok(Vec::new())
        }

        async fn update(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|e| e.id == enrollment.id) {
                *row = enrollment.clone();
            }
            Ok(())
        }
    }

    fn service(
        definitions: Vec<StepDefinition>,
    ) -> (EnrollmentService, Arc<MemoryEnrollments>, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 9, 0, 0).unwrap();
        let enrollments = Arc::new(MemoryEnrollments::default());
        let service = EnrollmentService::new(
            Arc::new(ManualClock::new(now)),
            Arc::new(FixedDefinitions { definitions }),
            Arc::clone(&enrollments) as Arc<dyn EnrollmentStore>,
        );
        (service, enrollments, now)
    }

    #[tokio::test]
    async fn enrolling_twice_creates_one_open_enrollment() {
        let (service, enrollments, _) = service(vec![StepDefinition::new(
            Category::Recall,
            1,
            Channel::Sms,
            2,
        )]);
        let contact = Contact::new("Noor", "Aziz");

        let first = service.enroll(&contact, Category::Recall).await.unwrap();
        assert_eq!(first, EnrollOutcome::Created);

        let second = service.enroll(&contact, Category::Recall).await.unwrap();
        assert_eq!(second, EnrollOutcome::AlreadyEnrolled);

        let rows = enrollments.rows.lock().unwrap();
        assert_eq!(rows.iter().filter(|e| e.is_open()).count(), 1);
    }

    #[tokio::test]
    async fn first_step_delay_sets_next_send_at() {
        let (service, enrollments, now) = service(vec![
            StepDefinition::new(Category::Recall, 1, Channel::Sms, 2),
            StepDefinition::new(Category::Nurture(InquiryKind::Emergency), 1, Channel::Sms, 1),
        ]);

        let patient = Contact::new("Ira", "Holt");
        service.enroll(&patient, Category::Recall).await.unwrap();

        let lead = Contact::new("Joy", "Lund").with_inquiry("tooth pain");
        service
            .enroll(&lead, Category::Nurture(InquiryKind::Emergency))
            .await
            .unwrap();

        let rows = enrollments.rows.lock().unwrap();
        let recall = rows.iter().find(|e| e.category == Category::Recall).unwrap();
        // Reactivation delays count days, nurture delays count hours
        assert_eq!(recall.next_send_at, now + chrono::Duration::days(2));

        let nurture = rows.iter().find(|e| e.category != Category::Recall).unwrap();
        assert_eq!(nurture.next_send_at, now + chrono::Duration::hours(1));
    }

    #[tokio::test]
    async fn no_definition_means_no_enrollment() {
        let (service, enrollments, _) = service(Vec::new());
        let contact = Contact::new("Kai", "Moreno");

        let outcome = service.enroll(&contact, Category::Lapsed).await.unwrap();
        assert_eq!(outcome, EnrollOutcome::NoStepDefinition);
        assert!(!outcome.created());
        assert!(enrollments.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn terminal_enrollment_does_not_block_reenrollment() {
        let (service, enrollments, now) = service(vec![StepDefinition::new(
            Category::Recall,
            1,
            Channel::Sms,
            0,
        )]);
        let contact = Contact::new("Lena", "Park");

        service.enroll(&contact, Category::Recall).await.unwrap();
        {
            let mut rows = enrollments.rows.lock().unwrap();
            rows[0].finish(TerminalStatus::Completed, now);
        }

        let outcome = service.enroll(&contact, Category::Recall).await.unwrap();
        assert_eq!(outcome, EnrollOutcome::Created);
    }
}
