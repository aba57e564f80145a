//! Domain event system: how the presentation layer observes a conversation.
//!
//! The orchestrator publishes an event for every phase transition, active
//! agent change, appended message, and rejected turn. Subscribers filter for
//! what they care about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::agent::{AgentId, TurnPhase};
use crate::error::TurnRejected;
use crate::message::ConversationMessage;

/// Why the router fell back to the default specialist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingFallback {
    /// The model selected a tool name with no matching specialist
    UnknownTool,
    /// The model selected nothing
    NoSelection,
    /// The classification call failed
    ProviderFailure,
    /// The classification call did not finish in time
    Timeout,
}

impl std::fmt::Display for RoutingFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTool => write!(f, "unknown_tool"),
            Self::NoSelection => write!(f, "no_selection"),
            Self::ProviderFailure => write!(f, "provider_failure"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The orchestrator moved to a new phase
    PhaseChanged {
        phase: TurnPhase,
        timestamp: DateTime<Utc>,
    },

    /// The "active agent" indicator changed
    ActiveAgentChanged {
        agent: AgentId,
        timestamp: DateTime<Utc>,
    },

    /// A message was appended to the conversation
    MessageAppended { message: ConversationMessage },

    /// A submit was refused before any state change
    TurnRejected {
        reason: TurnRejected,
        notice: String,
        timestamp: DateTime<Utc>,
    },

    /// Routing fell back to the default specialist
    RoutingFallback {
        reason: RoutingFallback,
        agent: AgentId,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::PhaseChanged {
            phase: TurnPhase::Routing,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::PhaseChanged { phase, .. } => assert_eq!(*phase, TurnPhase::Routing),
            _ => panic!("Expected PhaseChanged event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::TurnRejected {
            reason: TurnRejected::EmptyMessage,
            notice: TurnRejected::EmptyMessage.to_string(),
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        bus.publish(DomainEvent::ActiveAgentChanged {
            agent: AgentId::Navigator,
            timestamp: Utc::now(),
        });
    }
}
