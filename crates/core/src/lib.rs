//! # hospinav Core
//!
//! Domain types, traits, and error definitions for the hospinav
//! multi-agent navigator. This crate has no framework dependencies; it
//! defines the model every other crate implements against.
//!
//! - [`agent`]: the closed set of agents and their static registry
//! - [`tool`]: routing tools, the document tool, typed tool invocations
//! - [`message`]: the append-only conversation and the bounded turn context
//! - [`provider`]: the classify/generate capability trait
//! - [`event`]: domain events observed by the presentation layer

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod persona;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefinition, AgentId, AgentRegistry, Capability, TurnPhase};
pub use error::{Error, ProviderError, TurnRejected};
pub use event::{DomainEvent, EventBus, RoutingFallback};
pub use message::{
    Citation, Conversation, ConversationId, ConversationMessage, Speaker, Turn, TurnContext,
    TurnRole,
};
pub use provider::{
    ClassifyRequest, ClassifyResponse, GenerateRequest, GenerateResponse, Provider, RawCitation,
};
pub use tool::{DocumentRequest, ToolCall, ToolDefinition, ToolInvocation, ToolSpec};
