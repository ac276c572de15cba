use sqlx::FromRow;

/// Database model for an interview question. `question_order` is dense per
/// category starting at 0, assigned at creation and never renumbered.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Question {
    pub id: i64,
    pub category: String,
    pub question_text: String,
    pub question_order: i32,
}
