use sqlx::PgPool;

use crate::core::error::PersistenceError;
use crate::features::questions::models::Question;

/// Service for interview-question operations.
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Question>, PersistenceError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT id, category, question_text, question_order
             FROM questions
             WHERE category = $1
             ORDER BY question_order",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to list questions for category '{}': {:?}",
                category,
                e
            );
            PersistenceError::Database(e)
        })?;

        Ok(questions)
    }

    /// Appends a question at the next free order for the category. The order
    /// is computed inside the statement so concurrent appends to other
    /// categories cannot skew it.
    pub async fn add(&self, category: &str, text: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO questions (category, question_text, question_order)
             SELECT $1, $2, COUNT(*)::INT FROM questions WHERE category = $1",
        )
        .bind(category)
        .bind(text)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to add question for category '{}': {:?}", category, e);
            PersistenceError::Database(e)
        })?;

        Ok(())
    }

    /// Returns true iff a question with the given id existed.
    pub async fn update_text(&self, id: i64, text: &str) -> Result<bool, PersistenceError> {
        let result = sqlx::query("UPDATE questions SET question_text = $1 WHERE id = $2")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update question {}: {:?}", id, e);
                PersistenceError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
