mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::message::{SessionId, Turn};

/// Per-session conversation history.
///
/// Implementations own the history exclusively and serialize appends per
/// session, so concurrent callers on one session never lose a turn. No
/// eviction happens here; expiring old sessions is up to whoever runs the store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Every turn of the session, oldest first. Unknown sessions are empty.
    async fn get(&self, session: &SessionId) -> Result<Vec<Turn>, StoreError>;

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), StoreError>;

    /// Drops the whole history of a session.
    async fn clear(&self, session: &SessionId) -> Result<(), StoreError>;
}
