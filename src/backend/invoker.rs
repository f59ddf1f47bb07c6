use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use super::{CompletionRequest, GenerativeBackend, OutputSchema, StructuredOutput};
use crate::error::{BackendError, InvokeError};
use crate::message::Turn;
use crate::settings::GenerationSettings;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Calls a backend under a declared schema and hands back the decoded record.
#[derive(Clone)]
pub struct SchemaInvoker {
    backend: Arc<dyn GenerativeBackend>,
    request_timeout: Duration,
    backoff: Duration,
}

impl SchemaInvoker {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            request_timeout: DEFAULT_TIMEOUT,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Upper bound for a single attempt.
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Delay before the first retry; doubled on each following one.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn invoke<T: StructuredOutput>(
        &self,
        instructions: &str,
        input: &str,
        settings: &GenerationSettings,
        history: &[Turn],
    ) -> Result<T, InvokeError> {
        let schema = OutputSchema::of::<T>();
        let request = CompletionRequest {
            instructions,
            input,
            schema: &schema,
            settings,
            history,
        };

        let raw = self.complete_with_retries(request).await?;
        let value: T = serde_json::from_str(strip_code_fence(&raw)).map_err(|source| {
            log::warn!("Undecodable `{}` output: {raw}", T::NAME);
            InvokeError::Decode {
                schema: T::NAME,
                source,
            }
        })?;
        value.validate().map_err(|reason| InvokeError::Invalid {
            schema: T::NAME,
            reason,
        })?;
        Ok(value)
    }

    async fn complete_with_retries(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<String, InvokeError> {
        let max_attempts = request.settings.max_retries.saturating_add(1);
        let mut delay = self.backoff.min(MAX_BACKOFF);
        let mut attempt = 1;

        loop {
            let error = match timeout(self.request_timeout, self.backend.complete(request)).await {
                Ok(Ok(raw)) => return Ok(raw),
                Ok(Err(e)) => e,
                Err(_) => BackendError::Timeout,
            };

            if !error.is_transient() {
                log::error!("`{}` call failed: {error}", request.schema.name);
                return Err(InvokeError::Backend(error));
            }
            if attempt >= max_attempts {
                log::error!(
                    "`{}` call failed after {attempt} attempts: {error}",
                    request.schema.name
                );
                return Err(InvokeError::RetriesExhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            log::warn!(
                "`{}` attempt {attempt}/{max_attempts} failed, retrying in {delay:?}: {error}",
                request.schema.name
            );
            sleep(delay).await;
            delay = delay.saturating_mul(2).min(MAX_BACKOFF);
            attempt += 1;
        }
    }
}

// Some OpenAI compatible endpoints wrap JSON in a markdown fence even in schema mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
