use async_trait::async_trait;

use super::preambles::{INPUT_GUARDRAIL_PREAMBLE, OUTPUT_GUARDRAIL_PREAMBLE};
use super::verdict::{InputVerdict, OutputVerdict};
use crate::backend::SchemaInvoker;
use crate::settings::GenerationSettings;

/// Decides whether a request may reach the poet at all.
#[async_trait]
pub trait InputGate: Send + Sync {
    async fn check(&self, request: &str) -> InputVerdict;
}

/// Decides whether a generated poem may reach the user.
#[async_trait]
pub trait OutputGate: Send + Sync {
    async fn check(&self, candidate: &str) -> OutputVerdict;
}

/// Model-backed topic classifier. Fails closed.
#[derive(Clone)]
pub struct PoetryInputGate {
    invoker: SchemaInvoker,
    settings: GenerationSettings,
}

impl PoetryInputGate {
    pub fn new(invoker: SchemaInvoker, settings: GenerationSettings) -> Self {
        Self { invoker, settings }
    }
}

#[async_trait]
impl InputGate for PoetryInputGate {
    async fn check(&self, request: &str) -> InputVerdict {
        match self
            .invoker
            .invoke::<InputVerdict>(INPUT_GUARDRAIL_PREAMBLE, request, &self.settings, &[])
            .await
        {
            Ok(verdict) => verdict.normalized(),
            Err(e) => {
                log::warn!("Input guardrail unavailable, rejecting request: {e}");
                InputVerdict::rejected(format!("Could not classify the request: {e}"))
            }
        }
    }
}

/// Model-backed structural validator. Fails closed.
#[derive(Clone)]
pub struct PoemOutputGate {
    invoker: SchemaInvoker,
    settings: GenerationSettings,
}

impl PoemOutputGate {
    pub fn new(invoker: SchemaInvoker, settings: GenerationSettings) -> Self {
        Self { invoker, settings }
    }
}

#[async_trait]
impl OutputGate for PoemOutputGate {
    async fn check(&self, candidate: &str) -> OutputVerdict {
        let input = format!("Validate this poem output:\n{candidate}");
        match self
            .invoker
            .invoke::<OutputVerdict>(OUTPUT_GUARDRAIL_PREAMBLE, &input, &self.settings, &[])
            .await
        {
            Ok(verdict) => verdict.normalized(),
            Err(e) => {
                log::warn!("Output guardrail unavailable, rejecting poem: {e}");
                OutputVerdict::unavailable(format!("Could not validate the poem: {e}"))
            }
        }
    }
}
