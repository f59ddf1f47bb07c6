//! The generative backend seam and the schema-constrained invoker built on it.
//!
//! A backend only knows how to turn one [`CompletionRequest`] into raw text.
//! Decoding that text into a typed record, retrying transient failures and
//! enforcing timeouts is the invoker's job, so any backend (OpenAI, a local
//! model, a test double) gets the same guarantees.

mod invoker;
mod openai;

pub use invoker::*;
pub use openai::*;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BackendError;
use crate::message::Turn;
use crate::settings::GenerationSettings;

/// JSON schema the completion has to follow.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: Value,
}

impl OutputSchema {
    pub fn of<T: StructuredOutput>() -> Self {
        Self {
            name: T::NAME,
            description: T::DESCRIPTION,
            schema: T::json_schema(),
        }
    }
}

/// A record the backend is asked to produce as JSON.
pub trait StructuredOutput: DeserializeOwned + Send {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn json_schema() -> Value;

    /// Invariants serde cannot express. Runs after decoding.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Everything a backend needs for one completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub instructions: &'a str,
    pub input: &'a str,
    pub schema: &'a OutputSchema,
    pub settings: &'a GenerationSettings,
    pub history: &'a [Turn],
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Returns the raw completion text, expected to be JSON matching `request.schema`.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, BackendError>;
}
