use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::ConversationStore;
use crate::error::StoreError;
use crate::message::{SessionId, Turn};

type SessionLog = Arc<Mutex<Vec<Turn>>>;

/// Process-local store, one lock per session.
#[derive(Default)]
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<SessionId, SessionLog>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn session_log(&self, session: &SessionId) -> SessionLog {
        if let Some(log) = self.sessions.read().await.get(session) {
            return log.clone();
        }
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, session: &SessionId) -> Result<Vec<Turn>, StoreError> {
        let log = self.sessions.read().await.get(session).cloned();
        match log {
            Some(log) => Ok(log.lock().await.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), StoreError> {
        self.session_log(session).await.lock().await.push(turn);
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session);
        Ok(())
    }
}
