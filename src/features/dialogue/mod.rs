pub mod boundary;
pub mod engine;
pub mod event;
pub mod render;
pub mod runtime;
pub mod session;
pub mod state;
pub mod store;

pub use boundary::{ChatBoundary, EventKind, InboundEvent};
pub use engine::Engine;
pub use event::{Choice, Input};
pub use render::Reply;
pub use runtime::Dispatcher;
pub use session::{Session, SessionStore};
pub use state::State;
pub use store::{PgReviewStore, ReviewStore};
