//! Step definition lookup.

use super::{decode_failed, query_failed};
use async_trait::async_trait;
use chairside_engine::{DefinitionStore, StoreError};
use chairside_sequence::{Category, Channel, StepDefinition};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for step definition queries.
#[derive(FromRow)]
struct DefinitionRow {
    category: String,
    step_number: i32,
    channel: String,
    delay: i32,
    template_key: Option<String>,
    subject_line: Option<String>,
    active: bool,
}

impl DefinitionRow {
    fn try_into_definition(self) -> Result<StepDefinition, StoreError> {
        let category = Category::from_str(&self.category).map_err(decode_failed)?;
        let channel = Channel::from_str(&self.channel).map_err(decode_failed)?;
        let step_number = u32::try_from(self.step_number)
            .map_err(|_| decode_failed(format!("negative step number {}", self.step_number)))?;

        Ok(StepDefinition {
            category,
            step_number,
            channel,
            delay: i64::from(self.delay),
            template_key: self.template_key,
            subject_line: self.subject_line,
            active: self.active,
        })
    }
}

/// Repository for step definition lookups.
pub struct PgDefinitionStore {
    pool: PgPool,
}

impl PgDefinitionStore {
    /// Creates a new repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DefinitionStore for PgDefinitionStore {
    async fn find_active(
        &self,
        category: Category,
        step_number: u32,
    ) -> Result<Option<StepDefinition>, StoreError> {
        let row: Option<DefinitionRow> = sqlx::query_as(
            r#"
            SELECT category, step_number, channel, delay,
                   template_key, subject_line, active
            FROM step_definitions
            WHERE category = $1
              AND step_number = $2
              AND active = TRUE
            "#,
        )
        .bind(category.as_str())
        .bind(step_number as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        match row {
            Some(r) => Ok(Some(r.try_into_definition()?)),
            None => Ok(None),
        }
    }
}
