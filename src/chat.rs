// The request/response surface shared by the CLI and the HTTP server.

use serde::{Deserialize, Serialize};

use crate::message::SessionId;
use crate::poet::PoetryPipeline;

pub const EMPTY_MESSAGE_REPLY: &str = "Please provide a valid message.";
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't compose that.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Runs one message through the pipeline and turns any failure into the fallback reply.
pub async fn reply(pipeline: &PoetryPipeline, session: &SessionId, message: &str) -> ChatResponse {
    let message = message.trim();
    if message.is_empty() {
        return ChatResponse {
            response: EMPTY_MESSAGE_REPLY.to_string(),
        };
    }

    let response = match pipeline.generate(session, message).await {
        Ok(poem) => poem,
        Err(failure) => {
            log::warn!("[{session}] replying with fallback after {}", failure.kind());
            FALLBACK_REPLY.to_string()
        }
    };
    ChatResponse { response }
}
