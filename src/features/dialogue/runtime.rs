use std::sync::Arc;
use std::time::Duration;

use crate::core::error::Result;
use crate::core::guard::AdminGuard;
use crate::features::dialogue::boundary::{ChatBoundary, InboundEvent};
use crate::features::dialogue::engine::Engine;
use crate::features::dialogue::event::Input;
use crate::features::dialogue::session::SessionStore;
use crate::features::dialogue::store::ReviewStore;

const UNAUTHORIZED_NOTICE: &str = "У вас нет прав для использования этого бота.";

/// Routes inbound chat events: guard, session lookup, engine step, render.
/// One task per event; events for one identity are serialized by the session
/// lock, different identities run concurrently.
pub struct Dispatcher<S, B> {
    engine: Arc<Engine<S>>,
    boundary: Arc<B>,
    sessions: Arc<SessionStore>,
    guard: AdminGuard,
}

impl<S, B> Clone for Dispatcher<S, B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            boundary: self.boundary.clone(),
            sessions: self.sessions.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<S, B> Dispatcher<S, B>
where
    S: ReviewStore + 'static,
    B: ChatBoundary + 'static,
{
    pub fn new(engine: Engine<S>, boundary: B, guard: AdminGuard) -> Self {
        Self {
            engine: Arc::new(engine),
            boundary: Arc::new(boundary),
            sessions: Arc::new(SessionStore::new()),
            guard,
        }
    }

    pub async fn run(&self) -> Result<()> {
        loop {
            match self.boundary.recv().await {
                Ok(event) => {
                    let dispatcher = self.clone();
                    tokio::spawn(async move { dispatcher.dispatch(event).await });
                }
                Err(e) => {
                    tracing::error!("failed to receive chat event: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    pub async fn dispatch(&self, event: InboundEvent) {
        let identity = event.identity;

        if !self.guard.authorize(identity) {
            tracing::warn!(identity, "rejected unauthorized event");
            if let Err(e) = self.boundary.notify(identity, UNAUTHORIZED_NOTICE).await {
                tracing::error!(identity, "failed to deliver rejection notice: {}", e);
            }
            return;
        }

        let input = Input::from_event(&event);
        let session = self.sessions.entry(identity).await;
        let reply = {
            let mut session = session.lock().await;
            self.engine.handle(&mut session, input).await
        };

        if reply.end {
            self.sessions.remove(identity).await;
        }

        if let Err(e) = self
            .boundary
            .render(identity, &reply.text, &reply.choices)
            .await
        {
            tracing::error!(identity, "failed to render reply: {}", e);
        }
    }
}
