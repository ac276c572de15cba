pub mod models;
pub mod service;

pub use models::RegisteredUser;
pub use service::UserService;
