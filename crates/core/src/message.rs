//! Conversation messages and the per-invocation turn context.
//!
//! A [`Conversation`] is append-only: messages are never edited or
//! reordered once pushed. A [`TurnContext`] is a bounded, role-normalised
//! view of it, built fresh for each specialist call and then dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The end user
    User,
    /// The navigator or a specialist
    Agent,
    /// A UI-facing failure notice; never fed back to a model
    SystemError,
}

/// A cited source surfaced by a search-grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Unique message ID
    pub id: String,

    pub speaker: Speaker,

    /// The text content (markdown)
    pub text: String,

    /// Which agent produced this message (agent messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producing_agent: Option<AgentId>,

    pub timestamp: DateTime<Utc>,

    /// Sources backing the answer, in provider order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,

    /// File name of a generated document, e.g. `Invoice.pdf`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_artifact: Option<String>,
}

impl ConversationMessage {
    fn new(speaker: Speaker, text: String, producing_agent: Option<AgentId>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker,
            text,
            producing_agent,
            timestamp: Utc::now(),
            citations: Vec::new(),
            generated_artifact: None,
        }
    }

    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text.into(), None)
    }

    /// Create a new agent-authored message.
    pub fn agent(agent: AgentId, text: impl Into<String>) -> Self {
        Self::new(Speaker::Agent, text.into(), Some(agent))
    }

    /// Create a new system-error notice.
    pub fn system_error(text: impl Into<String>) -> Self {
        Self::new(Speaker::SystemError, text.into(), None)
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_artifact(mut self, artifact: Option<String>) -> Self {
        self.generated_artifact = artifact;
        self
    }
}

/// An ordered, append-only sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered messages
    messages: Vec<ConversationMessage>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message to the conversation.
    pub fn push(&mut self, message: ConversationMessage) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Role of a turn as seen by a specialist model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
}

/// One role-tagged turn of a [`TurnContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Agent,
            text: text.into(),
        }
    }
}

/// The bounded conversation handed to one specialist invocation.
///
/// The last turn is always the new user message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContext {
    pub turns: Vec<Turn>,
}

impl TurnContext {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}
