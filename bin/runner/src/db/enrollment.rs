//! Enrollment persistence: atomic conditional insert and leased claims.

use super::{decode_failed, query_failed, write_failed};
use async_trait::async_trait;
use chairside_core::{ContactId, EnrollmentId};
use chairside_engine::{EnrollmentStore, StoreError};
use chairside_sequence::{Category, Enrollment, EnrollmentStatus};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for enrollment queries.
#[derive(FromRow)]
struct EnrollmentRow {
    id: String,
    contact_id: String,
    category: String,
    current_step: i32,
    status: String,
    next_send_at: DateTime<Utc>,
    last_sent_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl EnrollmentRow {
    fn try_into_enrollment(self) -> Result<Enrollment, StoreError> {
        let id = EnrollmentId::from_str(&self.id).map_err(decode_failed)?;
        let contact_id = ContactId::from_str(&self.contact_id).map_err(decode_failed)?;
        let category = Category::from_str(&self.category).map_err(decode_failed)?;
        let status = EnrollmentStatus::from_str(&self.status).map_err(decode_failed)?;
        let current_step = u32::try_from(self.current_step)
            .map_err(|_| decode_failed(format!("negative step number {}", self.current_step)))?;

        Ok(Enrollment {
            id,
            contact_id,
            category,
            current_step,
            status,
            next_send_at: self.next_send_at,
            last_sent_at: self.last_sent_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
        })
    }
}

/// Repository for enrollment operations.
pub struct PgEnrollmentStore {
    pool: PgPool,
}

impl PgEnrollmentStore {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentStore for PgEnrollmentStore {
    async fn insert_if_no_open(&self, enrollment: &Enrollment) -> Result<bool, StoreError> {
        // The conflict target is the partial unique index over open
        // enrollments, which makes check-and-insert a single atomic
        // statement.
        let result = sqlx::query(
            r#"
            INSERT INTO enrollments
                (id, contact_id, category, current_step, status,
                 next_send_at, last_sent_at, completed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (contact_id, category)
                WHERE status IN ('active', 'paused')
            DO NOTHING
            "#,
        )
        .bind(enrollment.id.to_string())
        .bind(enrollment.contact_id.to_string())
        .bind(enrollment.category.as_str())
        .bind(enrollment.current_step as i32)
        .bind(enrollment.status.as_str())
        .bind(enrollment.next_send_at)
        .bind(enrollment.last_sent_at)
        .bind(enrollment.completed_at)
        .bind(enrollment.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;

        Ok(result.rows_affected() == 1)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: chrono::Duration,
        limit: i64,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let leased_until = now + lease;

        // SKIP LOCKED keeps concurrent runners from waiting on each
        // other's claims; the lease keeps them from re-claiming rows a
        // live runner already holds.
        let rows: Vec<EnrollmentRow> = sqlx::query_as(
            r#"
            UPDATE enrollments
            SET leased_until = $2
            WHERE id IN (
                SELECT id FROM enrollments
                WHERE status = 'active'
                  AND next_send_at <= $1
                  AND (leased_until IS NULL OR leased_until <= $1)
                ORDER BY next_send_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, contact_id, category, current_step, status,
                      next_send_at, last_sent_at, completed_at, created_at
            "#,
        )
        .bind(now)
        .bind(leased_until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        let mut enrollments: Vec<Enrollment> = rows
            .into_iter()
            .map(|r| r.try_into_enrollment())
            .collect::<Result<_, _>>()?;
        // RETURNING does not guarantee order
        enrollments.sort_by_key(|e| e.next_send_at);
        Ok(enrollments)
    }

    async fn update(&self, enrollment: &Enrollment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE enrollments
            SET current_step = $2, status = $3, next_send_at = $4,
                last_sent_at = $5, completed_at = $6
            WHERE id = $1
            "#,
        )
        .bind(enrollment.id.to_string())
        .bind(enrollment.current_step as i32)
        .bind(enrollment.status.as_str())
        .bind(enrollment.next_send_at)
        .bind(enrollment.last_sent_at)
        .bind(enrollment.completed_at)
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;

        Ok(())
    }
}
