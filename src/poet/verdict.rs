//! Typed records the guardrails and the poet are asked to return.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::backend::StructuredOutput;

pub const MIN_POEM_LINES: u32 = 4;
pub const MAX_POEM_LINES: u32 = 10;

const MISSING_REASON: &str = "no reason given by the validator";

/// Whether a request is about poetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputVerdict {
    pub explanation: String,
    #[serde(rename = "isPoetryRelated")]
    pub passed: bool,
}

impl InputVerdict {
    pub fn rejected(explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
            passed: false,
        }
        .normalized()
    }

    /// Fills in an explanation when a failing verdict came back without one.
    pub fn normalized(mut self) -> Self {
        if !self.passed && self.explanation.trim().is_empty() {
            self.explanation = "Not related to poetry.".to_string();
        }
        self
    }
}

impl StructuredOutput for InputVerdict {
    const NAME: &'static str = "poetry_check";
    const DESCRIPTION: &'static str = "Whether the user's message is related to poetry";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "explanation": {
                    "type": "string",
                    "description": "Short explanation of the decision"
                },
                "isPoetryRelated": {
                    "type": "boolean",
                    "description": "True if the message is about poetry, shayari, nazm, ghazal, poems or verses"
                }
            },
            "required": ["explanation", "isPoetryRelated"],
            "additionalProperties": false
        })
    }
}

/// Structural verdict on a generated poem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputVerdict {
    pub explanation: String,
    pub is_poem: bool,
    pub has_explanatory_prose: bool,
    pub line_count: u32,
    pub reason: String,
}

impl OutputVerdict {
    /// Verdict used when the validator could not be consulted.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            explanation: "Validation unavailable".to_string(),
            is_poem: false,
            has_explanatory_prose: false,
            line_count: 0,
            reason,
        }
        .normalized()
    }

    pub fn line_count_in_range(&self) -> bool {
        (MIN_POEM_LINES..=MAX_POEM_LINES).contains(&self.line_count)
    }

    /// All three conditions must hold; there is no partial pass.
    pub fn is_accepted(&self) -> bool {
        self.is_poem && !self.has_explanatory_prose && self.line_count_in_range()
    }

    /// Why the candidate was turned down, or `None` when it was accepted.
    pub fn rejection_reason(&self) -> Option<String> {
        if self.is_accepted() {
            return None;
        }
        let mut problems = Vec::new();
        if !self.is_poem {
            problems.push("not in verse form".to_string());
        }
        if self.has_explanatory_prose {
            problems.push("contains explanatory prose".to_string());
        }
        if !self.line_count_in_range() {
            problems.push(format!(
                "{} lines, expected {MIN_POEM_LINES} to {MAX_POEM_LINES}",
                self.line_count
            ));
        }
        Some(format!("{} ({})", self.reason, problems.join(", ")))
    }

    pub fn normalized(mut self) -> Self {
        if !self.is_accepted() {
            if self.reason.trim().is_empty() {
                self.reason = MISSING_REASON.to_string();
            }
            if self.explanation.trim().is_empty() {
                self.explanation = self.reason.clone();
            }
        }
        self
    }
}

impl StructuredOutput for OutputVerdict {
    const NAME: &'static str = "poem_validation";
    const DESCRIPTION: &'static str = "Structural validation of a generated poem";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "explanation": { "type": "string", "description": "Validation result summary" },
                "isPoem": { "type": "boolean", "description": "Verse form with artistic focus" },
                "hasExplanatoryProse": {
                    "type": "boolean",
                    "description": "Contains commentary, analysis or framing text"
                },
                "lineCount": { "type": "integer", "description": "Non-blank verse lines" },
                "reason": { "type": "string", "description": "Short reason for pass or fail" }
            },
            "required": ["explanation", "isPoem", "hasExplanatoryProse", "lineCount", "reason"],
            "additionalProperties": false
        })
    }
}

/// What the poet returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemDraft {
    pub poem: String,
}

impl StructuredOutput for PoemDraft {
    const NAME: &'static str = "poem";
    const DESCRIPTION: &'static str = "An original short poem, verse lines only";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "poem": {
                    "type": "string",
                    "description": "The poem, one verse line per line, without title or commentary"
                }
            },
            "required": ["poem"],
            "additionalProperties": false
        })
    }

    fn validate(&self) -> Result<(), String> {
        if self.poem.trim().is_empty() {
            Err("the poem is empty".to_string())
        } else {
            Ok(())
        }
    }
}
