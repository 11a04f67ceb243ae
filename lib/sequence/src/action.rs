//! Approval-queue actions: the engine's sole output artifact.
//!
//! An action is written once per processed step and consumed by the
//! external approval/dispatch process. It carries everything dispatch
//! needs (rendered content, contact addresses, sequence metadata) so
//! the consumer never has to query engine state.

use crate::category::Category;
use crate::contact::Contact;
use crate::enrollment::Enrollment;
use crate::step::{Channel, StepDefinition};
use chairside_core::{ActionId, ContactId, EnrollmentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rendered, not-yet-sent message awaiting human review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalAction {
    /// Unique identifier.
    pub id: ActionId,
    /// The enrollment this step belongs to.
    pub enrollment_id: EnrollmentId,
    /// The contact the message is addressed to.
    pub contact_id: ContactId,
    /// Display name, for the review queue.
    pub contact_name: String,
    /// Email address at queue time.
    pub email: Option<String>,
    /// Phone number at queue time.
    pub phone: Option<String>,
    /// The sequence category.
    pub category: Category,
    /// The step this action renders.
    pub step_number: u32,
    /// Channel(s) the step targets.
    pub channel: Channel,
    /// Subject line for the email rendition.
    pub subject_line: Option<String>,
    /// Template key, when a template produced the content.
    pub template_key: Option<String>,
    /// Rendered SMS body, when the channel wants one.
    pub sms_content: Option<String>,
    /// Rendered email body, when the channel wants one.
    pub email_content: Option<String>,
    /// Human-readable summary for the review queue.
    pub description: String,
    /// When the action was queued.
    pub created_at: DateTime<Utc>,
}

impl ApprovalAction {
    /// Creates an action for one step of an enrollment, without content.
    ///
    /// Content bodies are attached via [`with_sms_content`](Self::with_sms_content)
    /// and [`with_email_content`](Self::with_email_content).
    #[must_use]
    pub fn for_step(
        enrollment: &Enrollment,
        contact: &Contact,
        step: &StepDefinition,
        now: DateTime<Utc>,
    ) -> Self {
        let description = format!(
            "{} step {} for {}",
            enrollment.category,
            enrollment.current_step,
            contact.display_name()
        );
        Self {
            id: ActionId::new(),
            enrollment_id: enrollment.id,
            contact_id: contact.id,
            contact_name: contact.display_name(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            category: enrollment.category,
            step_number: enrollment.current_step,
            channel: step.channel,
            subject_line: step.subject_line.clone(),
            template_key: step.template_key.clone(),
            sms_content: None,
            email_content: None,
            description,
            created_at: now,
        }
    }

    /// Attaches the rendered SMS body.
    #[must_use]
    pub fn with_sms_content(mut self, body: impl Into<String>) -> Self {
        self.sms_content = Some(body.into());
        self
    }

    /// Attaches the rendered email body.
    #[must_use]
    pub fn with_email_content(mut self, body: impl Into<String>) -> Self {
        self.email_content = Some(body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn action_snapshots_contact_and_step() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let contact = Contact::new("Priya", "Natarajan")
            .with_email("priya@example.com")
            .with_phone("+15550100");
        let enrollment = Enrollment::new(
            contact.id,
            Category::Recall,
            chrono::Duration::zero(),
            now,
        );
        let step = StepDefinition::new(Category::Recall, 1, Channel::Both, 0)
            .with_template_key("recall_1")
            .with_subject_line("We miss you!");

        let action = ApprovalAction::for_step(&enrollment, &contact, &step, now)
            .with_sms_content("short")
            .with_email_content("longer");

        assert_eq!(action.enrollment_id, enrollment.id);
        assert_eq!(action.contact_id, contact.id);
        assert_eq!(action.email.as_deref(), Some("priya@example.com"));
        assert_eq!(action.phone.as_deref(), Some("+15550100"));
        assert_eq!(action.step_number, 1);
        assert_eq!(action.subject_line.as_deref(), Some("We miss you!"));
        assert_eq!(action.template_key.as_deref(), Some("recall_1"));
        assert_eq!(action.sms_content.as_deref(), Some("short"));
        assert_eq!(action.email_content.as_deref(), Some("longer"));
        assert_eq!(action.description, "recall step 1 for Priya Natarajan");
    }
}
