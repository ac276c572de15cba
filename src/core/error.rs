use thiserror::Error;

/// Failure of a persistence gateway operation. This is the only error type a
/// gateway method may return; raw `sqlx::Error` values never leave the
/// services.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Top-level application error for startup and transport paths.
#[derive(Debug, Error)]
#[allow(dead_code)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("telegram api error: {0}")]
    Telegram(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
