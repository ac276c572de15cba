use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::features::dialogue::state::State;

/// Scratch values carried across turns. Scoped to the active dialogue;
/// cleared when navigation returns to the main menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scratch {
    pub category: Option<String>,
    pub question_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Per-administrator dialogue record. Never shared across identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: i64,
    pub state: State,
    pub scratch: Scratch,
}

impl Session {
    pub fn new(identity: i64) -> Self {
        Self {
            identity,
            state: State::MainMenu,
            scratch: Scratch::default(),
        }
    }
}

/// Sessions keyed by administrator identity. The outer lock only guards map
/// entry and removal; each session has its own lock, so events for one
/// identity are serialized while different identities proceed concurrently.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for the identity, created at the main menu if absent.
    pub async fn entry(&self, identity: i64) -> Arc<Mutex<Session>> {
        let mut map = self.inner.lock().await;
        map.entry(identity)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(identity))))
            .clone()
    }

    pub async fn remove(&self, identity: i64) {
        self.inner.lock().await.remove(&identity);
    }

    #[allow(dead_code)]
    pub async fn contains(&self, identity: i64) -> bool {
        self.inner.lock().await.contains_key(&identity)
    }
}
