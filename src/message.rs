use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a conversation, chosen by whoever owns the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id, used when a front-end does not name its session.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    User,
    Poet,
}

/// One accepted exchange: what the user asked and the poem they got back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub request: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(request: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            response: response.into(),
            created_at: Utc::now(),
        }
    }

    /// The turn as the two chat messages it stands for, user first.
    pub fn messages(&self) -> [(MessageType, &str); 2] {
        [
            (MessageType::User, self.request.as_str()),
            (MessageType::Poet, self.response.as_str()),
        ]
    }
}
