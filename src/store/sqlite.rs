use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use super::ConversationStore;
use crate::error::StoreError;
use crate::message::{SessionId, Turn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversation_turns (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id  TEXT NOT NULL,
        request     TEXT NOT NULL,
        response    TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_conversation_turns_session
        ON conversation_turns (session_id, id);
";

/// Conversation log in a SQLite file.
///
/// All statements run on the single connection thread owned by
/// `tokio_rusqlite`, which serializes appends; row ids give the turn order.
#[derive(Clone)]
pub struct SqliteConversationStore {
    conn: Connection,
}

impl SqliteConversationStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path.as_ref()).await?;
        Self::with_connection(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn get(&self, session: &SessionId) -> Result<Vec<Turn>, StoreError> {
        let session = session.as_str().to_string();
        let turns = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT request, response, created_at FROM conversation_turns
                     WHERE session_id = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map([&session], |row| {
                    Ok(Turn {
                        request: row.get(0)?,
                        response: row.get(1)?,
                        created_at: row.get::<_, DateTime<Utc>>(2)?,
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await?;
        Ok(turns)
    }

    async fn append(&self, session: &SessionId, turn: Turn) -> Result<(), StoreError> {
        let session = session.as_str().to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO conversation_turns (session_id, request, response, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    (&session, &turn.request, &turn.response, &turn.created_at),
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), StoreError> {
        let session = session.as_str().to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM conversation_turns WHERE session_id = ?1",
                    [&session],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
