use crate::core::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url())
        .await
}

/// Statements the console needs in place before serving events. All are
/// idempotent, so startup can run them unconditionally.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS categories (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS users (
        telegram_id BIGINT PRIMARY KEY,
        category TEXT NOT NULL,
        display_name TEXT,
        note TEXT
    )",
    "CREATE TABLE IF NOT EXISTS questions (
        id BIGSERIAL PRIMARY KEY,
        category TEXT NOT NULL,
        question_text TEXT NOT NULL,
        question_order INT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS prompts (
        category TEXT PRIMARY KEY,
        prompt_text TEXT NOT NULL
    )",
];

pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
