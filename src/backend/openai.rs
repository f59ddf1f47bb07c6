use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

use super::{CompletionRequest, GenerativeBackend};
use crate::error::BackendError;
use crate::message::MessageType;
use crate::settings::Settings;

/// Chat Completions backend with JSON-schema response format.
#[derive(Clone, Debug)]
pub struct OpenAIBackend {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config).with_backoff(single_attempt()),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.openai_config(), settings.model.clone())
    }

    fn build_messages(
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, BackendError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.instructions)
                .build()?
                .into(),
        );

        for turn in request.history {
            for (message_type, content) in turn.messages() {
                let message: ChatCompletionRequestMessage = match message_type {
                    MessageType::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(content)
                        .build()?
                        .into(),
                    MessageType::Poet => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(content)
                        .build()?
                        .into(),
                };
                messages.push(message);
            }
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.input)
                .build()?
                .into(),
        );
        Ok(messages)
    }

    fn build_request(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<CreateChatCompletionRequest, BackendError> {
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some(request.schema.description.to_string()),
                name: request.schema.name.to_string(),
                schema: Some(request.schema.schema.clone()),
                strict: Some(true),
            },
        };

        let settings = request.settings;
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(request)?)
            .temperature(settings.temperature)
            .top_p(settings.top_p)
            .max_completion_tokens(settings.max_tokens)
            .response_format(response_format)
            .build()?;
        Ok(chat_request)
    }
}

// The client's own rate-limit backoff is switched off; `SchemaInvoker` owns retries.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[async_trait]
impl GenerativeBackend for OpenAIBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, BackendError> {
        let chat_request = self.build_request(&request)?;
        log::debug!(
            "OpenAI request: model={} schema={} history_turns={}",
            self.model,
            request.schema.name,
            request.history.len()
        );

        let response = self.client.chat().create(chat_request).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(BackendError::NoMessageFound)?;

        if let Some(refusal) = message.refusal {
            return Err(BackendError::Refused(refusal));
        }
        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or(BackendError::NoMessageFound)
    }
}
