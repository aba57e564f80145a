//! Conversation orchestrator: the per-turn state machine.
//!
//! ```text
//!            submit_user_message
//!   Idle ──────────────────────────▶ Routing ──────▶ Executing ──────▶ Idle
//!    ▲  (credential + non-empty      append user    build context     append
//!    │   + no turn in flight)        route          execute           agent reply
//!    │                                                    │
//!    └──────────── panic anywhere in the turn: append system error ◀──┘
//! ```
//!
//! One turn runs at a time. The orchestrator exclusively owns the
//! conversation history and the "active agent" indicator; the presentation
//! layer observes both through [`EventBus`] events and `watch` receivers.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use futures::FutureExt;
use hospinav_config::AppConfig;
use hospinav_core::agent::{AgentDefinition, AgentId, AgentRegistry, TurnPhase};
use hospinav_core::error::{Error, TurnRejected};
use hospinav_core::event::{DomainEvent, EventBus};
use hospinav_core::message::{Conversation, ConversationMessage};
use hospinav_core::provider::Provider;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, error, info};

use crate::context::ContextBuilder;
use crate::executor::SpecialistExecutor;
use crate::router::IntentRouter;

/// Notice appended when a turn fails outside every fallback.
pub const SYSTEM_ERROR_MESSAGE: &str =
    "Sorry, a system error occurred while processing your message. Please try again.";

/// Router and executor; only present when a credential is configured.
struct Pipeline {
    router: IntentRouter,
    executor: SpecialistExecutor,
}

/// Drives user turns through routing and execution.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    pipeline: Option<Pipeline>,
    context_builder: ContextBuilder,
    history: RwLock<Conversation>,
    phase: watch::Sender<TurnPhase>,
    active_agent: watch::Sender<AgentId>,
    event_bus: Arc<EventBus>,
    /// Held for the whole turn; `try_lock` failure means a turn is in flight
    turn_gate: Mutex<()>,
}

impl Orchestrator {
    /// Build an orchestrator from configuration, creating the provider when
    /// an API key is available.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let provider = if config.has_api_key() {
            Some(hospinav_providers::build_from_config(config)?)
        } else {
            info!("No API key configured, messages will be rejected until one is set");
            None
        };
        Ok(Self::new(config, provider))
    }

    /// Create an orchestrator over the built-in agents.
    ///
    /// `provider` is `None` when no credential is configured.
    pub fn new(config: &AppConfig, provider: Option<Arc<dyn Provider>>) -> Self {
        Self::with_registry(config, Arc::new(AgentRegistry::builtin().clone()), provider)
    }

    /// Create an orchestrator over an explicit registry.
    pub fn with_registry(
        config: &AppConfig,
        registry: Arc<AgentRegistry>,
        provider: Option<Arc<dyn Provider>>,
    ) -> Self {
        let pipeline = provider.map(|provider| Pipeline {
            router: IntentRouter::from_config(provider.clone(), registry.clone(), &config.routing),
            executor: SpecialistExecutor::from_config(provider, registry.clone(), &config.generation),
        });

        let mut conversation = Conversation::new();
        if let Some(welcome) = config.conversation.welcome() {
            conversation.push(ConversationMessage::agent(AgentId::Navigator, welcome));
        }

        let (phase, _) = watch::channel(TurnPhase::Idle);
        let (active_agent, _) = watch::channel(AgentId::Navigator);

        Self {
            registry,
            pipeline,
            context_builder: ContextBuilder::new(config.generation.context_window),
            history: RwLock::new(conversation),
            phase,
            active_agent,
            event_bus: Arc::new(EventBus::new(config.conversation.event_capacity)),
            turn_gate: Mutex::new(()),
        }
    }

    /// Replace the event bus, e.g. to share one across conversations.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Process one user message end to end.
    ///
    /// Rejections happen before any state change: nothing is appended and
    /// the phase stays `Idle`. Once accepted, the turn always completes
    /// with exactly one appended reply (agent message or system error).
    pub async fn submit_user_message(&self, text: &str) -> Result<(), TurnRejected> {
        let Some(pipeline) = &self.pipeline else {
            return Err(self.reject(TurnRejected::MissingCredential));
        };

        if text.trim().is_empty() {
            return Err(self.reject(TurnRejected::EmptyMessage));
        }

        let Ok(_turn) = self.turn_gate.try_lock() else {
            return Err(self.reject(TurnRejected::TurnInProgress));
        };

        let _reset = PhaseReset(self);
        let turn = AssertUnwindSafe(self.run_turn(pipeline, text))
            .catch_unwind()
            .await;

        if let Err(panic) = turn {
            error!(
                panic = panic_message(panic.as_ref()),
                "Turn failed outside every fallback, appending system error"
            );
            self.append(ConversationMessage::system_error(SYSTEM_ERROR_MESSAGE));
        }

        self.set_phase(TurnPhase::Idle);
        Ok(())
    }

    async fn run_turn(&self, pipeline: &Pipeline, text: &str) {
        self.set_active_agent(AgentId::Navigator);
        self.set_phase(TurnPhase::Routing);

        let history = self.messages();
        self.append(ConversationMessage::user(text));

        let routing = pipeline.router.route_with_outcome(text).await;
        if let Some(reason) = routing.fallback {
            self.event_bus.publish(DomainEvent::RoutingFallback {
                reason,
                agent: routing.agent,
                timestamp: Utc::now(),
            });
        }

        self.set_active_agent(routing.agent);
        self.set_phase(TurnPhase::Executing);

        let context = self.context_builder.build(&history, text);
        let outcome = pipeline.executor.execute(routing.agent, context).await;

        self.append(
            ConversationMessage::agent(routing.agent, outcome.text)
                .with_citations(outcome.citations)
                .with_artifact(outcome.generated_artifact),
        );
    }

    fn reject(&self, reason: TurnRejected) -> TurnRejected {
        debug!(reason = ?reason, "User message rejected");
        self.event_bus.publish(DomainEvent::TurnRejected {
            reason,
            notice: reason.to_string(),
            timestamp: Utc::now(),
        });
        reason
    }

    fn append(&self, message: ConversationMessage) {
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        self.event_bus
            .publish(DomainEvent::MessageAppended { message });
    }

    fn set_phase(&self, phase: TurnPhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!(from = %previous, to = %phase, "Phase changed");
            self.event_bus.publish(DomainEvent::PhaseChanged {
                phase,
                timestamp: Utc::now(),
            });
        }
    }

    fn set_active_agent(&self, agent: AgentId) {
        let previous = self.active_agent.send_replace(agent);
        if previous != agent {
            self.event_bus.publish(DomainEvent::ActiveAgentChanged {
                agent,
                timestamp: Utc::now(),
            });
        }
    }

    /// Whether a credential was configured.
    pub fn has_credential(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Snapshot of the conversation, oldest first.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .messages()
            .to_vec()
    }

    /// Snapshot of the whole conversation record.
    pub fn conversation(&self) -> Conversation {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> TurnPhase {
        *self.phase.borrow()
    }

    pub fn active_agent(&self) -> AgentId {
        *self.active_agent.borrow()
    }

    /// Agent definitions for status panels, navigator first.
    pub fn agents(&self) -> &[AgentDefinition] {
        self.registry.all()
    }

    pub fn watch_phase(&self) -> watch::Receiver<TurnPhase> {
        self.phase.subscribe()
    }

    pub fn watch_active_agent(&self) -> watch::Receiver<AgentId> {
        self.active_agent.subscribe()
    }

    /// Subscribe to all domain events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.event_bus.subscribe()
    }
}

/// Returns the phase to `Idle` if a turn is abandoned mid-flight.
struct PhaseReset<'a>(&'a Orchestrator);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0.set_phase(TurnPhase::Idle);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
