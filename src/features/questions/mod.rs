pub mod models;
pub mod service;

pub use models::Question;
pub use service::QuestionService;
