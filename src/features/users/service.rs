use sqlx::PgPool;

use crate::core::error::PersistenceError;
use crate::features::users::models::RegisteredUser;

/// Service for registered-user operations.
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List users registered under a category, stable order by id.
    pub async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<RegisteredUser>, PersistenceError> {
        let users = sqlx::query_as::<_, RegisteredUser>(
            "SELECT telegram_id, category, display_name, note
             FROM users
             WHERE category = $1
             ORDER BY telegram_id",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users for category '{}': {:?}", category, e);
            PersistenceError::Database(e)
        })?;

        Ok(users)
    }

    pub async fn get(&self, telegram_id: i64) -> Result<Option<RegisteredUser>, PersistenceError> {
        let user = sqlx::query_as::<_, RegisteredUser>(
            "SELECT telegram_id, category, display_name, note
             FROM users
             WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user {}: {:?}", telegram_id, e);
            PersistenceError::Database(e)
        })?;

        Ok(user)
    }

    /// Registers or re-registers a user. The category is always overwritten;
    /// display name and note are overwritten only when a new value is
    /// supplied, otherwise the stored value is kept. The category row is
    /// inserted in the same transaction when missing, so a registered user
    /// can never reference a category the pickers cannot see.
    pub async fn upsert(
        &self,
        telegram_id: i64,
        category: &str,
        display_name: Option<&str>,
        note: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await.map_err(PersistenceError::Database)?;

        let result: Result<(), sqlx::Error> = async {
            sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                .bind(category)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO users (telegram_id, category, display_name, note)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (telegram_id) DO UPDATE SET
                     category = EXCLUDED.category,
                     display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                     note = COALESCE(EXCLUDED.note, users.note)",
            )
            .bind(telegram_id)
            .bind(category)
            .bind(display_name)
            .bind(note)
            .execute(&mut *tx)
            .await?;

            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await.map_err(PersistenceError::Database)?;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to upsert user {}: {:?}", telegram_id, e);
                tx.rollback().await.ok();
                Err(PersistenceError::Database(e))
            }
        }
    }

    /// Returns true iff a row was removed.
    pub async fn delete(&self, telegram_id: i64) -> Result<bool, PersistenceError> {
        let result = sqlx::query("DELETE FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user {}: {:?}", telegram_id, e);
                PersistenceError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
