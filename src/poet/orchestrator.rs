use std::sync::Arc;

use strum_macros::Display;
use thiserror::Error;

use super::gates::{InputGate, OutputGate, PoemOutputGate, PoetryInputGate};
use super::preambles::POET_PREAMBLE;
use super::verdict::PoemDraft;
use crate::backend::{GenerativeBackend, OpenAIBackend, SchemaInvoker};
use crate::message::{SessionId, Turn};
use crate::settings::{GenerationSettings, Settings};
use crate::store::ConversationStore;

/// Closed set of reasons a `generate` call can end without a poem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FailureKind {
    EmptyInput,
    OutOfDomain,
    GenerationError,
    OutputRejected,
    StoreUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoemFailure {
    #[error("the request is empty")]
    EmptyInput,

    #[error("the request is not about poetry: {explanation}")]
    OutOfDomain { explanation: String },

    #[error("the poem could not be generated: {cause}")]
    GenerationError { cause: String },

    #[error("the generated poem was rejected: {reason}")]
    OutputRejected { reason: String },

    // The conversation log could not be read or written; only this request is lost.
    #[error("the conversation store is unavailable: {cause}")]
    StoreUnavailable { cause: String },
}

impl PoemFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            PoemFailure::EmptyInput => FailureKind::EmptyInput,
            PoemFailure::OutOfDomain { .. } => FailureKind::OutOfDomain,
            PoemFailure::GenerationError { .. } => FailureKind::GenerationError,
            PoemFailure::OutputRejected { .. } => FailureKind::OutputRejected,
            PoemFailure::StoreUnavailable { .. } => FailureKind::StoreUnavailable,
        }
    }
}

pub type PoemResult = Result<String, PoemFailure>;

/// Input guardrail, poet and output guardrail run as one request/response cycle.
///
/// Each call is a single pass: a rejected poem is discarded and never
/// regenerated here. Callers that want another attempt call `generate` again.
#[derive(Clone)]
pub struct PoetryPipeline {
    input_gate: Arc<dyn InputGate>,
    output_gate: Arc<dyn OutputGate>,
    invoker: SchemaInvoker,
    settings: GenerationSettings,
    store: Arc<dyn ConversationStore>,
}

impl PoetryPipeline {
    pub fn new(
        input_gate: Arc<dyn InputGate>,
        output_gate: Arc<dyn OutputGate>,
        invoker: SchemaInvoker,
        settings: GenerationSettings,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            input_gate,
            output_gate,
            invoker,
            settings,
            store,
        }
    }

    /// Wires both guardrails and the poet to one backend.
    pub fn with_backend(
        backend: Arc<dyn GenerativeBackend>,
        settings: &Settings,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        let invoker = SchemaInvoker::new(backend).with_timeout(settings.request_timeout());
        Self::new(
            Arc::new(PoetryInputGate::new(invoker.clone(), settings.guardrail)),
            Arc::new(PoemOutputGate::new(invoker.clone(), settings.guardrail)),
            invoker,
            settings.poet,
            store,
        )
    }

    pub fn from_settings(settings: &Settings, store: Arc<dyn ConversationStore>) -> Self {
        Self::with_backend(Arc::new(OpenAIBackend::from_settings(settings)), settings, store)
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub async fn generate(&self, session: &SessionId, request: &str) -> PoemResult {
        let result = self.run(session, request).await;
        match &result {
            Ok(poem) => log::info!(
                "[{session}] accepted poem ({} lines)",
                poem.lines().filter(|l| !l.trim().is_empty()).count()
            ),
            Err(failure) => log::info!("[{session}] {}: {failure}", failure.kind()),
        }
        result
    }

    async fn run(&self, session: &SessionId, request: &str) -> PoemResult {
        let request = request.trim();
        if request.is_empty() {
            return Err(PoemFailure::EmptyInput);
        }

        let verdict = self.input_gate.check(request).await;
        log::debug!(
            "[{session}] input checked: passed={} ({})",
            verdict.passed,
            verdict.explanation
        );
        if !verdict.passed {
            return Err(PoemFailure::OutOfDomain {
                explanation: verdict.explanation,
            });
        }

        let history = self
            .store
            .get(session)
            .await
            .map_err(|e| PoemFailure::StoreUnavailable { cause: e.to_string() })?;

        log::debug!("[{session}] generating with {} prior turns", history.len());
        let draft: PoemDraft = self
            .invoker
            .invoke(POET_PREAMBLE, request, &self.settings, &history)
            .await
            .map_err(|e| PoemFailure::GenerationError { cause: e.to_string() })?;
        let poem = draft.poem.trim().to_string();

        let verdict = self.output_gate.check(&poem).await;
        log::debug!(
            "[{session}] output checked: is_poem={} prose={} lines={}",
            verdict.is_poem,
            verdict.has_explanatory_prose,
            verdict.line_count
        );
        if let Some(reason) = verdict.rejection_reason() {
            log::debug!("[{session}] discarded candidate:\n{poem}");
            return Err(PoemFailure::OutputRejected { reason });
        }

        self.store
            .append(session, Turn::new(request, poem.clone()))
            .await
            .map_err(|e| PoemFailure::StoreUnavailable { cause: e.to_string() })?;
        Ok(poem)
    }
}
