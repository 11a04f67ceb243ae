//! Due-step processing: the engine's only send-adjacent effect.
//!
//! Each run claims a bounded batch of due enrollments and walks them
//! sequentially, one content resolution at a time, which is the only
//! backpressure the external generation service gets. Per-enrollment
//! failures are logged and counted; the batch always finishes.

use crate::error::EngineError;
use crate::policy::CategoryRegistry;
use crate::store::{ApprovalQueue, AudienceSource, ContactStore, DefinitionStore, EnrollmentStore};
use chairside_content::ContentResolver;
use chairside_core::Clock;
use chairside_sequence::{ApprovalAction, Enrollment, EnrollmentStatus, TerminalStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Maximum enrollments processed per run.
    pub batch_size: i64,
    /// How long a claimed enrollment stays leased to this runner.
    pub lease_seconds: i64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 30,
            lease_seconds: 300,
        }
    }
}

/// Result of one processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    /// Enrollments whose step was queued for approval.
    pub processed: u32,
    /// Enrollments that reached a terminal status this run.
    pub completed: u32,
    /// Enrollments that failed and will be retried on a later run.
    pub errors: u32,
}

/// What processing one enrollment did.
enum StepOutcome {
    /// Queued the step and moved to the next one.
    Advanced,
    /// Queued the final step and finished the sequence.
    SentAndCompleted,
    /// Finished without queuing anything (opt-out, resolved, exhausted).
    Terminated,
    /// Stale claim of a non-active enrollment; nothing to do.
    Skipped,
}

/// Advances due enrollments: terminal checks, content resolution, approval
/// queuing, and the step transition.
pub struct DueStepProcessor {
    clock: Arc<dyn Clock>,
    contacts: Arc<dyn ContactStore>,
    audience: Arc<dyn AudienceSource>,
    enrollments: Arc<dyn EnrollmentStore>,
    definitions: Arc<dyn DefinitionStore>,
    queue: Arc<dyn ApprovalQueue>,
    registry: Arc<CategoryRegistry>,
    resolver: ContentResolver,
    config: ProcessorConfig,
}

impl DueStepProcessor {
    /// Creates a processor.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        contacts: Arc<dyn ContactStore>,
        audience: Arc<dyn AudienceSource>,
        enrollments: Arc<dyn EnrollmentStore>,
        definitions: Arc<dyn DefinitionStore>,
        queue: Arc<dyn ApprovalQueue>,
        registry: Arc<CategoryRegistry>,
        resolver: ContentResolver,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            clock,
            contacts,
            audience,
            enrollments,
            definitions,
            queue,
            registry,
            resolver,
            config,
        }
    }

    /// Processes one batch of due enrollments.
    pub async fn process_due(&self) -> ProcessReport {
        let now = self.clock.now();
        let lease = chrono::Duration::seconds(self.config.lease_seconds);

        let due = match self
            .enrollments
            .claim_due(now, lease, self.config.batch_size)
            .await
        {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "failed to claim due enrollments");
                return ProcessReport {
                    errors: 1,
                    ..Default::default()
                };
            }
        };

        let mut report = ProcessReport::default();
        for mut enrollment in due {
            match self.process_one(&mut enrollment).await {
                Ok(StepOutcome::Advanced) => report.processed += 1,
                Ok(StepOutcome::SentAndCompleted) => {
                    report.processed += 1;
                    report.completed += 1;
                }
                Ok(StepOutcome::Terminated) => report.completed += 1,
                Ok(StepOutcome::Skipped) => {}
                Err(e) => {
                    tracing::warn!(
                        enrollment = %enrollment.id,
                        category = %enrollment.category,
                        error = %e,
                        "enrollment processing failed"
                    );
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            completed = report.completed,
            errors = report.errors,
            "due-step processing finished"
        );
        report
    }

    async fn process_one(&self, enrollment: &mut Enrollment) -> Result<StepOutcome, EngineError> {
        let now = self.clock.now();

        // A stale trigger can hand us a paused or terminal enrollment;
        // both are no-ops, not errors.
        if enrollment.status != EnrollmentStatus::Active {
            return Ok(StepOutcome::Skipped);
        }

        let contact = self
            .contacts
            .get(enrollment.contact_id)
            .await?
            .ok_or(EngineError::ContactMissing {
                enrollment_id: enrollment.id,
                contact_id: enrollment.contact_id,
            })?;

        if contact.opted_out {
            enrollment.finish(TerminalStatus::OptedOut, now);
            self.enrollments.update(enrollment).await?;
            return Ok(StepOutcome::Terminated);
        }

        let policy =
            self.registry
                .get(enrollment.category)
                .ok_or(EngineError::UnknownCategory {
                    category: enrollment.category,
                })?;

        if let Some(terminal) = policy
            .already_resolved(&contact, &*self.audience, now)
            .await?
        {
            enrollment.finish(terminal, now);
            self.enrollments.update(enrollment).await?;
            return Ok(StepOutcome::Terminated);
        }

        let Some(step) = self
            .definitions
            .find_active(enrollment.category, enrollment.current_step)
            .await?
        else {
            // Sequence exhausted; a normal ending
            enrollment.finish(TerminalStatus::Completed, now);
            self.enrollments.update(enrollment).await?;
            return Ok(StepOutcome::Terminated);
        };

        let content = self.resolver.resolve(&step, &contact).await;
        let mut action = ApprovalAction::for_step(enrollment, &contact, &step, now);
        if let Some(sms) = content.sms {
            action = action.with_sms_content(sms.body);
        }
        if let Some(email) = content.email {
            action = action.with_email_content(email.body);
        }
        self.queue.push(&action).await?;

        match self
            .definitions
            .find_active(enrollment.category, enrollment.current_step + 1)
            .await?
        {
            Some(next_step) => {
                enrollment.advance(next_step.delay_duration(), now);
                self.enrollments.update(enrollment).await?;
                Ok(StepOutcome::Advanced)
            }
            None => {
                enrollment.record_send(now);
                enrollment.finish(TerminalStatus::Completed, now);
                self.enrollments.update(enrollment).await?;
                Ok(StepOutcome::SentAndCompleted)
            }
        }
    }
}
