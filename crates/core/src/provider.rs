//! Provider trait: the abstraction over the model backend.
//!
//! A Provider exposes the two capabilities the router and the executor
//! need: single-shot tool *classification* and persona-driven *generation*.
//! Both may fail at any time with a [`ProviderError`]; callers own the
//! fallback policy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::TurnContext;
use crate::tool::{ToolCall, ToolDefinition, ToolSpec};

/// A single-shot "pick one tool" request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    /// System instruction (the navigator persona)
    pub instruction: String,

    /// The only selectable actions
    pub tools: Vec<ToolDefinition>,

    /// The raw user utterance; no history
    pub input: String,

    /// Sampling temperature (low for discrete selection)
    pub temperature: f32,
}

/// Tools the model selected, in the provider's own order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub selected_tools: Vec<String>,
}

/// A persona-driven generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// System instruction (the specialist persona)
    pub instruction: String,

    /// Tools derived from the specialist's capabilities
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,

    /// Bounded conversation, new user message last
    pub turns: TurnContext,
}

/// Grounding metadata exactly as the provider reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCitation {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Output of one generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text; may be empty when the model only called tools
    #[serde(default)]
    pub text: String,

    /// Tool invocations, in provider order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Search grounding sources, unfiltered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<RawCitation>,
}

/// The core Provider trait.
///
/// The router calls `classify()`, the executor calls `generate()`; neither
/// knows which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini").
    fn name(&self) -> &str;

    /// Ask the model to select among `request.tools`.
    async fn classify(
        &self,
        request: ClassifyRequest,
    ) -> Result<ClassifyResponse, ProviderError>;

    /// Generate a specialist reply.
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, ProviderError>;
}
