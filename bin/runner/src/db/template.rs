//! Message template lookup.

use async_trait::async_trait;
use chairside_content::{MessageTemplate, TemplateError, TemplateStore};
use sqlx::{FromRow, PgPool};

/// Row type for template queries.
#[derive(FromRow)]
struct TemplateRow {
    name: String,
    body: String,
    active: bool,
}

/// Repository for message templates.
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn find_active(&self, name: &str) -> Result<Option<MessageTemplate>, TemplateError> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT name, body, active
            FROM message_templates
            WHERE name = $1
              AND active = TRUE
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TemplateError::LookupFailed {
            reason: e.to_string(),
        })?;

        Ok(row.map(|r| MessageTemplate {
            name: r.name,
            body: r.body,
            active: r.active,
        }))
    }
}
