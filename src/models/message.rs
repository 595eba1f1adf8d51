use serde::{Deserialize, Serialize};

use crate::models::search::SearchReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Message {
    Search { query: String },
    Highlight { text: String },
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Highlight { .. } => "highlight",
        }
    }
}

/// Request as it travels between contexts: `{"id": 1, "action": "search", "query": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: RequestId,
    #[serde(flatten)]
    pub message: Message,
}

impl Envelope {
    pub fn new(id: RequestId, message: Message) -> Self {
        Self { id, message }
    }
}

/// Reply to a search envelope; `id` echoes the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub id: RequestId,
    #[serde(flatten)]
    pub reply: SearchReply,
}
