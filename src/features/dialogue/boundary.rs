use async_trait::async_trait;

use crate::core::error::Result;

/// The two input classes the engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A button press; payload is the opaque callback token.
    Choice,
    /// Free-form typed input; payload is the message text.
    Text,
}

/// One raw chat event, already reduced to what the engine needs.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub identity: i64,
    pub kind: EventKind,
    pub payload: String,
}

/// Port to the chat transport. The production implementation lives in
/// `modules::telegram`; tests substitute a recording fake.
#[async_trait]
pub trait ChatBoundary: Send + Sync {
    /// Next inbound event. Events are a live sequence; whatever is not
    /// consumed is lost.
    async fn recv(&self) -> Result<InboundEvent>;

    /// Sends a message with an inline keyboard built from `(label, token)`
    /// pairs. Best-effort delivery.
    async fn render(&self, identity: i64, text: &str, choices: &[(String, String)]) -> Result<()>;

    /// One-shot status or error message outside the keyboard flow.
    async fn notify(&self, identity: i64, text: &str) -> Result<()>;
}
