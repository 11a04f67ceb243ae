//! Approval-queue writes.

use super::write_failed;
use async_trait::async_trait;
use chairside_engine::{ApprovalQueue, StoreError};
use chairside_sequence::ApprovalAction;
use sqlx::PgPool;

/// Write-once repository for approval-queue actions.
pub struct PgApprovalQueue {
    pool: PgPool,
}

impl PgApprovalQueue {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalQueue for PgApprovalQueue {
    async fn push(&self, action: &ApprovalAction) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO approval_actions
                (id, enrollment_id, contact_id, contact_name, email, phone,
                 category, step_number, channel, subject_line, template_key,
                 sms_content, email_content, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(action.id.to_string())
        .bind(action.enrollment_id.to_string())
        .bind(action.contact_id.to_string())
        .bind(&action.contact_name)
        .bind(&action.email)
        .bind(&action.phone)
        .bind(action.category.as_str())
        .bind(action.step_number as i32)
        .bind(action.channel.as_str())
        .bind(&action.subject_line)
        .bind(&action.template_key)
        .bind(&action.sms_content)
        .bind(&action.email_content)
        .bind(&action.description)
        .bind(action.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;

        Ok(())
    }
}
