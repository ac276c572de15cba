use sqlx::PgPool;

use crate::core::error::PersistenceError;
use crate::shared::constants::{DEFAULT_PROMPT_TEMPLATE, DEFAULT_QUESTIONS};

/// Service for business-category operations. Categories are first-class rows;
/// "category exists" means a row in the `categories` table, which keeps newly
/// created categories visible to every picker before any user is registered.
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<String>, PersistenceError> {
        let names: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to list categories: {:?}", e);
                    PersistenceError::Database(e)
                })?;

        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    /// Creates a category together with its default questions and prompt, as
    /// one transaction. Returns false when the category already existed, in
    /// which case nothing is seeded.
    pub async fn create(&self, name: &str) -> Result<bool, PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(PersistenceError::Database)?;

        let result: Result<bool, sqlx::Error> = async {
            let inserted =
                sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                    .bind(name)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

            if inserted == 0 {
                return Ok(false);
            }

            for (order, question) in DEFAULT_QUESTIONS.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO questions (category, question_text, question_order)
                     VALUES ($1, $2, $3)",
                )
                .bind(name)
                .bind(question)
                .bind(order as i32)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query(
                "INSERT INTO prompts (category, prompt_text) VALUES ($1, $2)
                 ON CONFLICT (category) DO UPDATE SET prompt_text = EXCLUDED.prompt_text",
            )
            .bind(name)
            .bind(DEFAULT_PROMPT_TEMPLATE)
            .execute(&mut *tx)
            .await?;

            Ok(true)
        }
        .await;

        match result {
            Ok(created) => {
                tx.commit().await.map_err(PersistenceError::Database)?;
                Ok(created)
            }
            Err(e) => {
                tracing::error!("Failed to create category '{}': {:?}", name, e);
                tx.rollback().await.ok();
                Err(PersistenceError::Database(e))
            }
        }
    }
}
