//! Eligibility scanning: selecting candidates and enrolling them.

use crate::enroll::{EnrollOutcome, EnrollmentService};
use crate::policy::CategoryRegistry;
use crate::store::AudienceSource;
use chairside_core::Clock;
use chairside_sequence::Category;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Candidate batch cap per category per run.
    pub category_batch: i64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { category_batch: 20 }
    }
}

/// Per-category result of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScan {
    /// The category scanned.
    pub category: Category,
    /// Contacts newly enrolled.
    pub enrolled: u32,
    /// Candidates skipped (already enrolled, or no sequence defined).
    pub skipped: u32,
}

/// Result of one full scan across all registered categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// One entry per registered category, in registration order.
    pub categories: Vec<CategoryScan>,
    /// Query or enrollment failures; each was logged and skipped over.
    pub errors: u32,
}

impl ScanReport {
    /// Total contacts enrolled across all categories.
    #[must_use]
    pub fn total_enrolled(&self) -> u32 {
        self.categories.iter().map(|c| c.enrolled).sum()
    }

    /// Total candidates skipped across all categories.
    #[must_use]
    pub fn total_skipped(&self) -> u32 {
        self.categories.iter().map(|c| c.skipped).sum()
    }
}

/// Walks the category registry and enrolls eligible contacts.
///
/// The scanner never writes enrollment state directly; every candidate
/// goes through the [`EnrollmentService`]. Categories are independent:
/// a failing category is logged and counted, and the scan moves on.
pub struct EligibilityScanner {
    clock: Arc<dyn Clock>,
    audience: Arc<dyn AudienceSource>,
    registry: Arc<CategoryRegistry>,
    enroller: EnrollmentService,
    config: ScanConfig,
}

impl EligibilityScanner {
    /// Creates a scanner.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        audience: Arc<dyn AudienceSource>,
        registry: Arc<CategoryRegistry>,
        enroller: EnrollmentService,
        config: ScanConfig,
    ) -> Self {
        Self {
            clock,
            audience,
            registry,
            enroller,
            config,
        }
    }

    /// Runs one scan over every registered category.
    pub async fn run(&self) -> ScanReport {
        let now = self.clock.now();
        let mut report = ScanReport::default();

        for policy in self.registry.iter() {
            let category = policy.category();
            let mut scan = CategoryScan {
                category,
                enrolled: 0,
                skipped: 0,
            };

            let candidates = match policy
                .candidates(&*self.audience, now, self.config.category_batch)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(category = %category, error = %e, "candidate query failed");
                    report.errors += 1;
                    report.categories.push(scan);
                    continue;
                }
            };

            for contact in candidates {
                // Queries exclude opt-outs, but the flag may have flipped
                // since the row was read.
                if contact.opted_out {
                    continue;
                }

                match self.enroller.enroll(&contact, category).await {
                    Ok(EnrollOutcome::Created) => {
                        scan.enrolled += 1;
                        if let Err(e) = policy.after_enroll(&contact, &*self.audience).await {
                            tracing::warn!(
                                category = %category,
                                contact = %contact.id,
                                error = %e,
                                "post-enrollment hook failed"
                            );
                            report.errors += 1;
                        }
                    }
                    Ok(_) => scan.skipped += 1,
                    Err(e) => {
                        tracing::warn!(
                            category = %category,
                            contact = %contact.id,
                            error = %e,
                            "enrollment failed"
                        );
                        report.errors += 1;
                    }
                }
            }

            report.categories.push(scan);
        }

        tracing::info!(
            enrolled = report.total_enrolled(),
            skipped = report.total_skipped(),
            errors = report.errors,
            "eligibility scan finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DefinitionStore, EnrollmentStore, StoreError};
    use async_trait::async_trait;
    use chairside_core::{ContactId, ManualClock};
    use chairside_sequence::{Channel, Contact, Enrollment, StepDefinition};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAudience {
        recall: Vec<Contact>,
        no_shows: Vec<Contact>,
        followed_up: Mutex<HashSet<ContactId>>,
    }

    #[async_trait]
    impl AudienceSource for FakeAudience {
        async fn recall_candidates(
            &self,
            _last_visit_before: NaiveDate,
            limit: i64,
        ) -> Result<Vec<Contact>, StoreError> {
            Ok(self.recall.iter().take(limit as usize).cloned().collect())
        }

        async fn lapsed_candidates(
            &self,
            _last_visit_before: NaiveDate,
            _limit: i64,
        ) -> Result<Vec<Contact>, StoreError> {
            Ok(Vec::new())
        }

        async fn no_show_candidates(
            &self,
            _on_or_after: NaiveDate,
            _limit: i64,
        ) -> Result<Vec<Contact>, StoreError> {
            let followed_up = self.followed_up.lock().unwrap();
            Ok(self
                .no_shows
                .iter()
                .filter(|c| !followed_up.contains(&c.id))
                .cloned()
                .collect())
        }

        async fn open_treatment_plan_candidates(
            &self,
            _limit: i64,
        ) -> Result<Vec<Contact>, StoreError> {
            Ok(Vec::new())
        }

        async fn unconverted_leads(&self, _limit: i64) -> Result<Vec<Contact>, StoreError> {
            Ok(Vec::new())
        }

        async fn has_upcoming_appointment(
            &self,
            _contact_id: ContactId,
            _on_or_after: NaiveDate,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn mark_no_show_followed_up(
            &self,
            contact_id: ContactId,
        ) -> Result<(), StoreError> {
            self.followed_up.lock().unwrap().insert(contact_id);
            Ok(())
        }
    }

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

        async fn update(&self, _enrollment: &Enrollment) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn scanner(
        audience: FakeAudience,
        definitions: Vec<StepDefinition>,
    ) -> (EligibilityScanner, Arc<MemoryEnrollments>) {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 7, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(now));
        let enrollments = Arc::new(MemoryEnrollments::default());
        let definitions = Arc::new(FixedDefinitions { definitions });
        let enroller = EnrollmentService::new(
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&definitions) as Arc<dyn DefinitionStore>,
            Arc::clone(&enrollments) as Arc<dyn EnrollmentStore>,
        );
        let scanner = EligibilityScanner::new(
            clock,
            Arc::new(audience),
            Arc::new(CategoryRegistry::with_defaults()),
            enroller,
            ScanConfig::default(),
        );
        (scanner, enrollments)
    }

    #[tokio::test]
    async fn scan_enrolls_recall_candidates_once() {
        let audience = FakeAudience {
            recall: vec![Contact::new("Ana", "Silva"), Contact::new("Ben", "Okoye")],
            ..Default::default()
        };
        let (scanner, enrollments) = scanner(
            audience,
            vec![StepDefinition::new(Category::Recall, 1, Channel::Sms, 0)],
        );

        let report = scanner.run().await;
        let recall = report
            .categories
            .iter()
            .find(|c| c.category == Category::Recall)
            .unwrap();
        assert_eq!(recall.enrolled, 2);
        assert_eq!(recall.skipped, 0);
        assert_eq!(report.errors, 0);
        assert_eq!(enrollments.rows.lock().unwrap().len(), 2);

        // Second scan finds the same candidates already enrolled
        let report = scanner.run().await;
        let recall = report
            .categories
            .iter()
            .find(|c| c.category == Category::Recall)
            .unwrap();
        assert_eq!(recall.enrolled, 0);
        assert_eq!(recall.skipped, 2);
        assert_eq!(enrollments.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn opted_out_candidate_is_never_enrolled() {
        let audience = FakeAudience {
            recall: vec![Contact::new("Cleo", "Marsh").opted_out()],
            ..Default::default()
        };
        let (scanner, enrollments) = scanner(
            audience,
            vec![StepDefinition::new(Category::Recall, 1, Channel::Sms, 0)],
        );

        let report = scanner.run().await;
        assert_eq!(report.total_enrolled(), 0);
        assert!(enrollments.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn candidates_without_definitions_are_skipped() {
        let audience = FakeAudience {
            recall: vec![Contact::new("Dev", "Anand")],
            ..Default::default()
        };
        // No step definitions at all
        let (scanner, enrollments) = scanner(audience, Vec::new());

        let report = scanner.run().await;
        let recall = report
            .categories
            .iter()
            .find(|c| c.category == Category::Recall)
            .unwrap();
        assert_eq!(recall.enrolled, 0);
        assert_eq!(recall.skipped, 1);
        assert!(enrollments.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_show_is_flagged_and_seen_by_one_scan_only() {
        let no_show = Contact::new("Esa", "Virtanen");
        let audience = FakeAudience {
            no_shows: vec![no_show],
            ..Default::default()
        };
        let (scanner, enrollments) = scanner(
            audience,
            vec![StepDefinition::new(
                Category::MissedAppointment,
                1,
                Channel::Sms,
                1,
            )],
        );

        let report = scanner.run().await;
        let missed = report
            .categories
            .iter()
            .find(|c| c.category == Category::MissedAppointment)
            .unwrap();
        assert_eq!(missed.enrolled, 1);

        // The follow-up flag hides the no-show from the next scan entirely
        let report = scanner.run().await;
        let missed = report
            .categories
            .iter()
            .find(|c| c.category == Category::MissedAppointment)
            .unwrap();
        assert_eq!(missed.enrolled, 0);
        assert_eq!(missed.skipped, 0);
        assert_eq!(enrollments.rows.lock().unwrap().len(), 1);
    }
}
