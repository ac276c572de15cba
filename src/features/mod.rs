pub mod categories;
pub mod dialogue;
pub mod prompts;
pub mod questions;
pub mod users;
