#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ghazal::backend::{CompletionRequest, GenerativeBackend, StructuredOutput};
use ghazal::poet::{InputVerdict, OutputVerdict, PoemDraft};
use ghazal::{BackendError, ConversationStore, InMemoryConversationStore, PoetryPipeline, Settings};
use serde_json::json;

pub const CHECK: &str = <InputVerdict as StructuredOutput>::NAME;
pub const POEM: &str = <PoemDraft as StructuredOutput>::NAME;
pub const VALIDATE: &str = <OutputVerdict as StructuredOutput>::NAME;

pub const URDU_GHAZAL: &str = "بادل برسے تو یاد آئی تیری\n\
بھیگی شام میں بات آئی تیری\n\
چھت پہ ٹپکتی بوندوں کی صدا\n\
جیسے دل تک سوغات آئی تیری";

/// Backend double answering from per-schema queues and counting calls.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<&'static str, VecDeque<Result<String, BackendError>>>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    poet_history_lens: Mutex<Vec<usize>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, schema: &'static str, reply: Result<String, BackendError>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(schema)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn classify(&self, is_poetry: bool) -> &Self {
        let explanation = if is_poetry {
            "This is about poetry."
        } else {
            "Not related to poetry."
        };
        self.reply(
            CHECK,
            Ok(json!({ "explanation": explanation, "isPoetryRelated": is_poetry }).to_string()),
        )
    }

    pub fn compose(&self, poem: &str) -> &Self {
        self.reply(POEM, Ok(json!({ "poem": poem }).to_string()))
    }

    pub fn validate(&self, is_poem: bool, has_explanatory_prose: bool, line_count: u32) -> &Self {
        self.reply(
            VALIDATE,
            Ok(json!({
                "explanation": "validated",
                "isPoem": is_poem,
                "hasExplanatoryProse": has_explanatory_prose,
                "lineCount": line_count,
                "reason": "scripted verdict",
            })
            .to_string()),
        )
    }

    /// Scripts one full accepted cycle.
    pub fn accept(&self, poem: &str) -> &Self {
        let lines = poem.lines().filter(|l| !l.trim().is_empty()).count() as u32;
        self.classify(true).compose(poem).validate(true, false, lines)
    }

    pub fn calls(&self, schema: &str) -> usize {
        self.calls.lock().unwrap().get(schema).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn poet_history_lens(&self) -> Vec<usize> {
        self.poet_history_lens.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, BackendError> {
        let schema = request.schema.name;
        *self.calls.lock().unwrap().entry(schema).or_default() += 1;
        if schema == POEM {
            self.poet_history_lens
                .lock()
                .unwrap()
                .push(request.history.len());
        }
        self.replies
            .lock()
            .unwrap()
            .get_mut(schema)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(BackendError::NoMessageFound))
    }
}

pub fn pipeline(backend: Arc<ScriptedBackend>) -> (PoetryPipeline, Arc<InMemoryConversationStore>) {
    let store = Arc::new(InMemoryConversationStore::new());
    let pipeline = PoetryPipeline::with_backend(backend, &Settings::default(), store.clone());
    (pipeline, store)
}

pub async fn history_len(store: &dyn ConversationStore, session: &str) -> usize {
    store.get(&session.into()).await.unwrap().len()
}
