//! Specialist executor: one persona-driven generation, normalised.
//!
//! The executor offers a specialist only the tools its capabilities
//! unlock, invokes generation once, and turns whatever comes back into an
//! [`ExecutionOutcome`]. Provider failures, timeouts, and empty answers all
//! become a fixed apology; `execute` never fails.

use std::sync::Arc;
use std::time::Duration;

use hospinav_config::GenerationConfig;
use hospinav_core::agent::{AgentDefinition, AgentId, AgentRegistry, Capability};
use hospinav_core::message::{Citation, TurnContext};
use hospinav_core::provider::{GenerateRequest, GenerateResponse, Provider, RawCitation};
use hospinav_core::tool::{DocumentRequest, ToolInvocation, ToolSpec, document_tool};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Reply used whenever a specialist cannot produce an answer.
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again in a moment.";

/// Normalised result of one specialist invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    /// Never empty
    pub text: String,

    pub citations: Vec<Citation>,

    /// File name of the last generated document, if any
    pub generated_artifact: Option<String>,

    /// True when `text` is the apology rather than a model answer
    #[serde(skip)]
    pub degraded: bool,
}

impl ExecutionOutcome {
    /// The fixed apology outcome.
    pub fn apology() -> Self {
        Self {
            text: APOLOGY_MESSAGE.into(),
            citations: Vec::new(),
            generated_artifact: None,
            degraded: true,
        }
    }
}

/// Invokes specialists and normalises their output.
pub struct SpecialistExecutor {
    provider: Arc<dyn Provider>,
    registry: Arc<AgentRegistry>,
    default_document_format: String,
    timeout: Duration,
}

impl SpecialistExecutor {
    /// Create an executor with the default policy (PDF, 120s).
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<AgentRegistry>) -> Self {
        Self::from_config(provider, registry, &GenerationConfig::default())
    }

    /// Create an executor from the `[generation]` config section.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        registry: Arc<AgentRegistry>,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            default_document_format: config.default_document_format.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The tool set a specialist receives, derived from capabilities only.
    pub fn tools_for(definition: &AgentDefinition) -> Vec<ToolSpec> {
        let mut tools = Vec::new();
        if definition.has(Capability::Search) {
            tools.push(ToolSpec::WebSearch);
        }
        if definition.has(Capability::DocumentGeneration) {
            tools.push(ToolSpec::Function(document_tool()));
        }
        tools
    }

    /// Invoke `agent` on `context`. Never fails.
    pub async fn execute(&self, agent: AgentId, context: TurnContext) -> ExecutionOutcome {
        let definition = self.registry.lookup(agent);
        let request = GenerateRequest {
            instruction: definition.persona_prompt.clone(),
            tools: Self::tools_for(definition),
            turns: context,
        };

        debug!(
            agent = %agent,
            provider = self.provider.name(),
            tools = request.tools.len(),
            turns = request.turns.len(),
            "Invoking specialist"
        );

        let response = match tokio::time::timeout(self.timeout, self.provider.generate(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(agent = %agent, error = %e, "Specialist generation failed, replying with apology");
                return ExecutionOutcome::apology();
            }
            Err(_) => {
                warn!(
                    agent = %agent,
                    timeout_secs = self.timeout.as_secs(),
                    "Specialist generation timed out, replying with apology"
                );
                return ExecutionOutcome::apology();
            }
        };

        let outcome = self.normalize(definition, response);
        info!(
            agent = %agent,
            degraded = outcome.degraded,
            citations = outcome.citations.len(),
            artifact = outcome.generated_artifact.as_deref().unwrap_or("-"),
            "Specialist replied"
        );
        outcome
    }

    /// Turn a raw generation into an outcome.
    fn normalize(&self, definition: &AgentDefinition, response: GenerateResponse) -> ExecutionOutcome {
        let mut documents: Vec<DocumentRequest> = Vec::new();

        for call in &response.tool_calls {
            match ToolInvocation::decode(call) {
                ToolInvocation::GenerateDocument(request)
                    if definition.has(Capability::DocumentGeneration) =>
                {
                    documents.push(request);
                }
                ToolInvocation::GenerateDocument(_) => {
                    warn!(agent = %definition.id, "Document requested by an agent without that capability, ignoring");
                }
                ToolInvocation::Unrecognized { name } => {
                    warn!(agent = %definition.id, tool = %name, "Ignoring unrecognized tool call");
                }
            }
        }

        if documents.len() > 1 {
            let superseded: Vec<String> = documents[..documents.len() - 1]
                .iter()
                .map(|d| d.artifact_name(&self.default_document_format))
                .collect();
            warn!(
                agent = %definition.id,
                superseded = ?superseded,
                "Several documents requested in one turn, only the last is surfaced"
            );
        }

        let document = documents.pop();
        let generated_artifact = document
            .as_ref()
            .map(|d| d.artifact_name(&self.default_document_format));

        let text = match (response.text.trim().is_empty(), &document) {
            (false, _) => response.text,
            (true, Some(document)) => self.confirmation(document),
            (true, None) => {
                warn!(agent = %definition.id, "Specialist returned an empty answer, replying with apology");
                return ExecutionOutcome::apology();
            }
        };

        ExecutionOutcome {
            text,
            citations: flatten_citations(response.citations),
            generated_artifact,
            degraded: false,
        }
    }

    fn confirmation(&self, document: &DocumentRequest) -> String {
        format!(
            "I've prepared your {} as a {} file. You can download it below.",
            document.document_type,
            document
                .effective_format(&self.default_document_format)
                .to_uppercase()
        )
    }
}

/// Flatten grounding metadata, dropping entries without a URL.
///
/// A missing or blank title is replaced by the URL.
pub fn flatten_citations(raw: Vec<RawCitation>) -> Vec<Citation> {
    raw.into_iter()
        .filter_map(|c| {
            let url = c.url.filter(|u| !u.trim().is_empty())?;
            let title = c
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| url.clone());
            Some(Citation { title, url })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, Step, cited_response, tool_response};
    use hospinav_core::error::ProviderError;
    use hospinav_core::message::Turn;
    use hospinav_core::persona::MEDICAL_RECORDS_PERSONA;
    use hospinav_core::tool::{DOCUMENT_TOOL_NAME, ToolCall};
    use serde_json::json;
    use std::collections::BTreeSet;

    fn executor(provider: ScriptedProvider) -> (SpecialistExecutor, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let registry = Arc::new(AgentRegistry::builtin().clone());
        (SpecialistExecutor::new(provider.clone(), registry), provider)
    }

    fn context(text: &str) -> TurnContext {
        TurnContext {
            turns: vec![Turn::user(text)],
        }
    }

    fn document_call(args: serde_json::Value) -> ToolCall {
        ToolCall::new(DOCUMENT_TOOL_NAME, args)
    }

    #[test]
    fn no_capabilities_means_no_tools() {
        let mut definition = AgentRegistry::builtin().lookup(AgentId::Appointment).clone();
        definition.capabilities = BTreeSet::new();
        assert!(SpecialistExecutor::tools_for(&definition).is_empty());
    }

    #[test]
    fn both_capabilities_mean_two_tools() {
        let definition = AgentRegistry::builtin().lookup(AgentId::Billing);
        let tools = SpecialistExecutor::tools_for(definition);
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0], ToolSpec::WebSearch);
        assert!(matches!(&tools[1], ToolSpec::Function(t) if t.name == DOCUMENT_TOOL_NAME));
    }

    #[tokio::test]
    async fn generation_request_uses_persona_and_capability_tools() {
        let (executor, provider) = executor(ScriptedProvider::new().replies("Here are your records."));
        let outcome = executor
            .execute(AgentId::MedicalRecords, context("Show my lab results"))
            .await;
        assert_eq!(outcome.text, "Here are your records.");
        assert!(!outcome.degraded);

        let requests = provider.generate_requests();
        assert_eq!(requests[0].instruction, MEDICAL_RECORDS_PERSONA);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].turns, context("Show my lab results"));
    }

    #[tokio::test]
    async fn document_without_text_gets_confirmation() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Reply(tool_response(
            "",
            vec![document_call(json!({"documentType": "Medical Record"}))],
        ))));
        let outcome = executor
            .execute(AgentId::MedicalRecords, context("I need my medical record"))
            .await;
        assert_eq!(outcome.generated_artifact.as_deref(), Some("Medical Record.pdf"));
        assert!(outcome.text.contains("Medical Record"));
        assert!(outcome.text.contains("PDF"));
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn model_text_is_kept_alongside_document() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Reply(tool_response(
            "Your invoice is ready.",
            vec![document_call(json!({"documentType": "Invoice", "format": "PDF"}))],
        ))));
        let outcome = executor.execute(AgentId::Billing, context("invoice please")).await;
        assert_eq!(outcome.text, "Your invoice is ready.");
        assert_eq!(outcome.generated_artifact.as_deref(), Some("Invoice.pdf"));
    }

    #[tokio::test]
    async fn last_document_wins() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Reply(tool_response(
            "",
            vec![
                document_call(json!({"documentType": "Invoice", "format": "PDF"})),
                document_call(json!({"documentType": "Receipt", "format": "DOCX"})),
            ],
        ))));
        let outcome = executor.execute(AgentId::Billing, context("documents")).await;
        assert_eq!(outcome.generated_artifact.as_deref(), Some("Receipt.docx"));
        assert!(outcome.text.contains("Receipt"));
    }

    #[tokio::test]
    async fn unknown_tool_calls_are_ignored() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Reply(tool_response(
            "Done.",
            vec![ToolCall::new("send_email", json!({}))],
        ))));
        let outcome = executor.execute(AgentId::PatientInfo, context("hi")).await;
        assert_eq!(outcome.text, "Done.");
        assert!(outcome.generated_artifact.is_none());
    }

    #[tokio::test]
    async fn document_from_agent_without_capability_is_ignored() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Reply(tool_response(
            "",
            vec![document_call(json!({"documentType": "Appointment Slip"}))],
        ))));
        let outcome = executor.execute(AgentId::Appointment, context("slip")).await;
        assert!(outcome.generated_artifact.is_none());
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn citations_are_flattened() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Reply(cited_response(
            "Visiting hours are 9 to 5.",
            vec![
                (Some("Visiting hours"), Some("https://hospital.example/visit")),
                (Some("No link"), None),
                (None, Some("https://hospital.example/faq")),
            ],
        ))));
        let outcome = executor.execute(AgentId::PatientInfo, context("hours?")).await;
        assert_eq!(
            outcome.citations,
            vec![
                Citation {
                    title: "Visiting hours".into(),
                    url: "https://hospital.example/visit".into(),
                },
                Citation {
                    title: "https://hospital.example/faq".into(),
                    url: "https://hospital.example/faq".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn provider_failure_becomes_apology() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Fail(
            ProviderError::RateLimited {
                retry_after_secs: 5,
            },
        )));
        let outcome = executor.execute(AgentId::Billing, context("bill")).await;
        assert_eq!(outcome, ExecutionOutcome::apology());
        assert!(!outcome.text.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_becomes_apology() {
        let (executor, _) = executor(ScriptedProvider::new().generate(Step::Hang));
        let executor = executor.with_timeout(Duration::from_secs(10));
        let outcome = executor.execute(AgentId::Appointment, context("book")).await;
        assert!(outcome.degraded);
        assert_eq!(outcome.text, APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn blank_answer_becomes_apology() {
        let (executor, _) = executor(ScriptedProvider::new().replies("   "));
        let outcome = executor.execute(AgentId::PatientInfo, context("hello")).await;
        assert!(outcome.degraded);
        assert!(outcome.citations.is_empty());
        assert!(outcome.generated_artifact.is_none());
    }

    #[tokio::test]
    async fn configured_default_format_applies() {
        let provider = Arc::new(ScriptedProvider::new().generate(Step::Reply(tool_response(
            "",
            vec![document_call(json!({"documentType": "Registration Form"}))],
        ))));
        let config = GenerationConfig {
            default_document_format: "DOCX".into(),
            ..GenerationConfig::default()
        };
        let executor = SpecialistExecutor::from_config(
            provider,
            Arc::new(AgentRegistry::builtin().clone()),
            &config,
        );
        let outcome = executor.execute(AgentId::PatientInfo, context("register me")).await;
        assert_eq!(outcome.generated_artifact.as_deref(), Some("Registration Form.docx"));
        assert!(outcome.text.contains("DOCX"));
    }
}
