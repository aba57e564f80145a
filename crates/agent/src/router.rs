//! Intent router: the navigator's single classification step.
//!
//! The navigator never answers the user. It asks the provider to pick
//! exactly one routing tool and maps that tool back to a specialist.
//! Every selection-shaped failure resolves to the default specialist, so
//! routing always yields an agent.

use std::sync::Arc;
use std::time::Duration;

use hospinav_config::RoutingConfig;
use hospinav_core::agent::{AgentId, AgentRegistry};
use hospinav_core::error::ProviderError;
use hospinav_core::event::RoutingFallback;
use hospinav_core::provider::{ClassifyRequest, Provider};
use hospinav_core::tool::{ToolDefinition, routing_catalog};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of one routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingOutcome {
    /// Always a specialist
    pub agent: AgentId,

    /// The tool name the model selected, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_tool: Option<String>,

    /// Set when `agent` is the default specialist because classification failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<RoutingFallback>,
}

impl RoutingOutcome {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Maps a free-text utterance to one specialist.
pub struct IntentRouter {
    provider: Arc<dyn Provider>,
    registry: Arc<AgentRegistry>,
    /// Routing tools offered to the model, built once
    catalog: Vec<ToolDefinition>,
    default_specialist: AgentId,
    temperature: f32,
    timeout: Duration,
}

impl IntentRouter {
    /// Create a router with the default policy (patient info, 0.1, 30s).
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<AgentRegistry>) -> Self {
        Self::from_config(provider, registry, &RoutingConfig::default())
    }

    /// Create a router from the `[routing]` config section.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        registry: Arc<AgentRegistry>,
        config: &RoutingConfig,
    ) -> Self {
        let catalog = routing_catalog(&registry);
        Self {
            provider,
            registry,
            catalog,
            default_specialist: AgentId::PatientInfo,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
        .with_default_specialist(config.default_specialist)
    }

    /// Set the fallback specialist. The navigator is refused.
    pub fn with_default_specialist(mut self, id: AgentId) -> Self {
        if id.is_specialist() {
            self.default_specialist = id;
        } else {
            warn!(
                requested = %id,
                kept = %self.default_specialist,
                "Navigator cannot be the default specialist, keeping previous default"
            );
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_specialist(&self) -> AgentId {
        self.default_specialist
    }

    /// The routing tools offered to the model.
    pub fn catalog(&self) -> &[ToolDefinition] {
        &self.catalog
    }

    /// Route an utterance to a specialist. Never fails.
    pub async fn route(&self, user_text: &str) -> AgentId {
        self.route_with_outcome(user_text).await.agent
    }

    /// Route an utterance and report how the decision was reached.
    pub async fn route_with_outcome(&self, user_text: &str) -> RoutingOutcome {
        let navigator = self.registry.lookup(AgentId::Navigator);
        let request = ClassifyRequest {
            instruction: navigator.persona_prompt.clone(),
            tools: self.catalog.clone(),
            input: user_text.to_string(),
            temperature: self.temperature,
        };

        debug!(
            provider = self.provider.name(),
            tools = request.tools.len(),
            "Classifying user message"
        );

        let outcome = match tokio::time::timeout(self.timeout, self.provider.classify(request)).await
        {
            Ok(Ok(response)) => self.select(response.selected_tools),
            Ok(Err(e)) => {
                warn!(error = %e, "Classification failed, routing to default specialist");
                let reason = match e {
                    ProviderError::Timeout(_) => RoutingFallback::Timeout,
                    _ => RoutingFallback::ProviderFailure,
                };
                self.fallback(reason, None)
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Classification timed out, routing to default specialist"
                );
                self.fallback(RoutingFallback::Timeout, None)
            }
        };

        info!(
            agent = %outcome.agent,
            tool = outcome.selected_tool.as_deref().unwrap_or("-"),
            fallback = ?outcome.fallback,
            "Routed user message"
        );

        outcome
    }

    /// Apply the selection policy to the model's tool choices.
    fn select(&self, selected: Vec<String>) -> RoutingOutcome {
        if selected.len() > 1 {
            warn!(
                count = selected.len(),
                selected = ?selected,
                "Navigator selected more than one tool, using the first"
            );
        }

        let Some(first) = selected.into_iter().next() else {
            warn!("Navigator selected no tool, routing to default specialist");
            return self.fallback(RoutingFallback::NoSelection, None);
        };

        match AgentId::from_routing_tool(&first) {
            Some(agent) => RoutingOutcome {
                agent,
                selected_tool: Some(first),
                fallback: None,
            },
            None => {
                warn!(tool = %first, "Navigator selected an unknown tool, routing to default specialist");
                self.fallback(RoutingFallback::UnknownTool, Some(first))
            }
        }
    }

    fn fallback(&self, reason: RoutingFallback, selected_tool: Option<String>) -> RoutingOutcome {
        RoutingOutcome {
            agent: self.default_specialist,
            selected_tool,
            fallback: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, Step};
    use hospinav_core::persona::NAVIGATOR_PERSONA;

    fn router(provider: ScriptedProvider) -> (IntentRouter, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let registry = Arc::new(AgentRegistry::builtin().clone());
        (IntentRouter::new(provider.clone(), registry), provider)
    }

    #[tokio::test]
    async fn recognized_tool_maps_to_specialist() {
        let (router, _) = router(ScriptedProvider::new().selects(&["Appointment_Scheduler"]));
        let outcome = router
            .route_with_outcome("I want to book an appointment with a doctor")
            .await;
        assert_eq!(outcome.agent, AgentId::Appointment);
        assert_eq!(outcome.selected_tool.as_deref(), Some("Appointment_Scheduler"));
        assert!(!outcome.is_fallback());
    }

    #[tokio::test]
    async fn classification_request_shape() {
        let (router, provider) =
            router(ScriptedProvider::new().selects(&["Billing_And_Insurance_Agent"]));
        assert_eq!(router.route("How much is my bill?").await, AgentId::Billing);

        let requests = provider.classify_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.instruction, NAVIGATOR_PERSONA);
        assert_eq!(request.input, "How much is my bill?");
        assert_eq!(request.tools.len(), AgentId::SPECIALISTS.len());
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn unknown_tool_falls_back() {
        let (router, _) = router(ScriptedProvider::new().selects(&["delegate_to_pharmacy"]));
        let outcome = router.route_with_outcome("Where is the pharmacy?").await;
        assert_eq!(outcome.agent, AgentId::PatientInfo);
        assert_eq!(outcome.fallback, Some(RoutingFallback::UnknownTool));
        assert_eq!(outcome.selected_tool.as_deref(), Some("delegate_to_pharmacy"));
    }

    #[tokio::test]
    async fn no_selection_falls_back() {
        let (router, _) = router(ScriptedProvider::new().selects(&[]));
        let outcome = router.route_with_outcome("Hello there").await;
        assert_eq!(outcome.agent, AgentId::PatientInfo);
        assert_eq!(outcome.fallback, Some(RoutingFallback::NoSelection));
    }

    #[tokio::test]
    async fn multiple_selections_use_first() {
        let (router, _) = router(
            ScriptedProvider::new().selects(&["Medical_Records_Agent", "Appointment_Scheduler"]),
        );
        let outcome = router.route_with_outcome("My lab results and a follow-up").await;
        assert_eq!(outcome.agent, AgentId::MedicalRecords);
        assert!(!outcome.is_fallback());
    }

    #[tokio::test]
    async fn provider_failure_falls_back() {
        let (router, _) = router(ScriptedProvider::new().classify(Step::Fail(
            ProviderError::AuthenticationFailed("bad key".into()),
        )));
        let outcome = router.route_with_outcome("Anything").await;
        assert_eq!(outcome.agent, AgentId::PatientInfo);
        assert_eq!(outcome.fallback, Some(RoutingFallback::ProviderFailure));
    }

    #[tokio::test]
    async fn provider_timeout_error_is_reported_as_timeout() {
        let (router, _) = router(ScriptedProvider::new().classify(Step::Fail(
            ProviderError::Timeout("upstream deadline".into()),
        )));
        let outcome = router.route_with_outcome("Anything").await;
        assert_eq!(outcome.fallback, Some(RoutingFallback::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back() {
        let (router, _) = router(ScriptedProvider::new().classify(Step::Hang));
        let router = router.with_timeout(Duration::from_secs(5));
        let outcome = router.route_with_outcome("Anything").await;
        assert_eq!(outcome.fallback, Some(RoutingFallback::Timeout));
        assert!(outcome.agent.is_specialist());
    }

    #[tokio::test]
    async fn configured_default_specialist_is_used() {
        let provider = Arc::new(ScriptedProvider::new().selects(&[]));
        let config = RoutingConfig {
            default_specialist: AgentId::Billing,
            ..RoutingConfig::default()
        };
        let router = IntentRouter::from_config(
            provider,
            Arc::new(AgentRegistry::builtin().clone()),
            &config,
        );
        assert_eq!(router.route("?").await, AgentId::Billing);
    }

    #[test]
    fn navigator_is_refused_as_default() {
        let (router, _) = router(ScriptedProvider::new());
        let router = router.with_default_specialist(AgentId::Navigator);
        assert_eq!(router.default_specialist(), AgentId::PatientInfo);
    }

    #[tokio::test]
    async fn navigator_tool_name_is_never_routable() {
        // The navigator has no routing tool, so even a tool named after it falls back.
        let (router, _) = router(ScriptedProvider::new().selects(&["Smart_Navigator"]));
        let outcome = router.route_with_outcome("Who are you?").await;
        assert_ne!(outcome.agent, AgentId::Navigator);
        assert!(outcome.is_fallback());
    }
}
