pub mod service;

pub use service::PromptService;
