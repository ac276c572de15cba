use sqlx::PgPool;

use crate::core::error::PersistenceError;
use crate::shared::constants::DEFAULT_PROMPT_TEMPLATE;

/// Service for generation-prompt operations. At most one prompt per category;
/// a missing row is not an error, the fixed default template is returned.
pub struct PromptService {
    pool: PgPool,
}

impl PromptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, category: &str) -> Result<String, PersistenceError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT prompt_text FROM prompts WHERE category = $1")
                .bind(category)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to get prompt for category '{}': {:?}", category, e);
                    PersistenceError::Database(e)
                })?;

        Ok(row
            .map(|(text,)| text)
            .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()))
    }

    pub async fn upsert(&self, category: &str, template: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO prompts (category, prompt_text) VALUES ($1, $2)
             ON CONFLICT (category) DO UPDATE SET prompt_text = EXCLUDED.prompt_text",
        )
        .bind(category)
        .bind(template)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert prompt for category '{}': {:?}", category, e);
            PersistenceError::Database(e)
        })?;

        Ok(())
    }
}
