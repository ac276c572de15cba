use sqlx::FromRow;

/// Database model for an end user registered against a business category.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RegisteredUser {
    pub telegram_id: i64,
    pub category: String,
    pub display_name: Option<String>,
    pub note: Option<String>,
}
