//! Contact reads and audience selection queries.

use super::{decode_failed, query_failed, write_failed};
use async_trait::async_trait;
use chairside_core::ContactId;
use chairside_engine::{AudienceSource, ContactStore, StoreError};
use chairside_sequence::{Contact, LeadStatus};
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for contact queries.
#[derive(FromRow)]
struct ContactRow {
    id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    opted_out: bool,
    lead_status: Option<String>,
    inquiry: Option<String>,
    note: Option<String>,
    last_visit: Option<NaiveDate>,
}

impl ContactRow {
    fn try_into_contact(self) -> Result<Contact, StoreError> {
        let id = ContactId::from_str(&self.id).map_err(decode_failed)?;
        let lead_status = match self.lead_status {
            Some(s) => Some(
                LeadStatus::parse(&s)
                    .ok_or_else(|| decode_failed(format!("unknown lead status '{s}'")))?,
            ),
            None => None,
        };

        Ok(Contact {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            opted_out: self.opted_out,
            lead_status,
            inquiry: self.inquiry,
            note: self.note,
            last_visit: self.last_visit,
        })
    }
}

/// Repository for contact reads and audience scans.
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn rows_into_contacts(rows: Vec<ContactRow>) -> Result<Vec<Contact>, StoreError> {
        rows.into_iter().map(|r| r.try_into_contact()).collect()
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn get(&self, id: ContactId) -> Result<Option<Contact>, StoreError> {
        let row: Option<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, phone, opted_out,
                   lead_status, inquiry, note, last_visit
            FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        match row {
            Some(r) => Ok(Some(r.try_into_contact()?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AudienceSource for PgContactStore {
    async fn recall_candidates(
        &self,
        last_visit_before: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, phone, opted_out,
                   lead_status, inquiry, note, last_visit
            FROM contacts
            WHERE patient_status = 'active'
              AND opted_out = FALSE
              AND last_visit < $1
            ORDER BY last_visit ASC
            LIMIT $2
            "#,
        )
        .bind(last_visit_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Self::rows_into_contacts(rows)
    }

    async fn lapsed_candidates(
        &self,
        last_visit_before: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, phone, opted_out,
                   lead_status, inquiry, note, last_visit
            FROM contacts
            WHERE opted_out = FALSE
              AND last_visit < $1
            ORDER BY last_visit ASC
            LIMIT $2
            "#,
        )
        .bind(last_visit_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Self::rows_into_contacts(rows)
    }

    async fn no_show_candidates(
        &self,
        on_or_after: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT c.id, c.first_name, c.last_name, c.email, c.phone,
                   c.opted_out, c.lead_status, c.inquiry, c.note, c.last_visit
            FROM contacts c
            JOIN appointments a ON a.contact_id = c.id
            WHERE a.status = 'no_show'
              AND a.no_show_followed_up = FALSE
              AND a.appointment_date >= $1
              AND c.opted_out = FALSE
            LIMIT $2
            "#,
        )
        .bind(on_or_after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Self::rows_into_contacts(rows)
    }

    async fn open_treatment_plan_candidates(
        &self,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT c.id, c.first_name, c.last_name, c.email, c.phone,
                   c.opted_out, c.lead_status, c.inquiry, c.note, c.last_visit
            FROM contacts c
            JOIN treatment_plans tp ON tp.contact_id = c.id
            WHERE tp.status IN ('presented', 'partially_accepted')
              AND c.opted_out = FALSE
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Self::rows_into_contacts(rows)
    }

    async fn unconverted_leads(&self, limit: i64) -> Result<Vec<Contact>, StoreError> {
        let rows: Vec<ContactRow> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, email, phone, opted_out,
                   lead_status, inquiry, note, last_visit
            FROM contacts
            WHERE lead_status IN ('new', 'contacted')
              AND opted_out = FALSE
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        Self::rows_into_contacts(rows)
    }

    async fn has_upcoming_appointment(
        &self,
        contact_id: ContactId,
        on_or_after: NaiveDate,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM appointments
                WHERE contact_id = $1
                  AND status IN ('scheduled', 'confirmed', 'completed')
                  AND appointment_date >= $2
            )
            "#,
        )
        .bind(contact_id.to_string())
        .bind(on_or_after)
        .fetch_one(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(exists)
    }

    async fn mark_no_show_followed_up(&self, contact_id: ContactId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE appointments
            SET no_show_followed_up = TRUE
            WHERE contact_id = $1
              AND status = 'no_show'
              AND no_show_followed_up = FALSE
            "#,
        )
        .bind(contact_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(write_failed)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_decodes_into_contact() {
        let row = ContactRow {
            id: ContactId::new().to_string(),
            first_name: "Dana".to_string(),
            last_name: "Whitfield".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            opted_out: false,
            lead_status: Some("contacted".to_string()),
            inquiry: Some("implant options".to_string()),
            note: None,
            last_visit: None,
        };

        let contact = row.try_into_contact().expect("decodes");
        assert_eq!(contact.first_name, "Dana");
        assert_eq!(contact.lead_status, Some(LeadStatus::Contacted));
    }

    #[test]
    fn row_with_unknown_lead_status_fails_decode() {
        let row = ContactRow {
            id: ContactId::new().to_string(),
            first_name: "Eli".to_string(),
            last_name: "Stone".to_string(),
            email: None,
            phone: None,
            opted_out: false,
            lead_status: Some("teleported".to_string()),
            inquiry: None,
            note: None,
            last_visit: None,
        };

        assert!(row.try_into_contact().is_err());
    }
}
