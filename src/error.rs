use async_openai::error::OpenAIError;
use thiserror::Error;

// Enum for handling various application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Logger already set: {0}")]
    Logger(#[from] log::SetLoggerError),
}

// Errors raised by a generative backend for a single completion attempt.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] OpenAIError),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Model refused to answer: {0}")]
    Refused(String),

    #[error("No message found")]
    NoMessageFound,

    // Only produced by test doubles and custom backends.
    #[error("Transient backend failure: {0}")]
    Transient(String),
}

impl BackendError {
    /// Whether a new attempt has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout | BackendError::Transient(_) => true,
            BackendError::OpenAI(OpenAIError::Reqwest(e)) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
            }
            BackendError::OpenAI(OpenAIError::ApiError(api)) => {
                // 5xx bodies are not JSON and come back with neither type nor code.
                if api.r#type.is_none() && api.code.is_none() {
                    return true;
                }
                let code = api.code.as_deref().unwrap_or_default();
                let kind = api.r#type.as_deref().unwrap_or_default();
                code == "rate_limit_exceeded" || kind == "server_error" || kind == "requests"
            }
            _ => false,
        }
    }
}

// Failures of a schema-constrained invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: BackendError },

    #[error("could not decode `{schema}` output: {source}")]
    Decode {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{schema}` output is invalid: {reason}")]
    Invalid {
        schema: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),

    #[error("Session `{0}` is unavailable")]
    Unavailable(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
