//! Agent identities, definitions, and the process-wide registry.
//!
//! The set of agents is closed: one navigator plus four specialists. Every
//! identity has exactly one [`AgentDefinition`]; totality is enforced at
//! compile time by the exhaustive match in [`builtin_definition`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::error::Error;
use crate::persona;

/// One of the fixed agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    /// Classifies intent and delegates; never answers the user itself
    Navigator,
    PatientInfo,
    Appointment,
    MedicalRecords,
    Billing,
}

impl AgentId {
    /// Every identity, in presentation order.
    pub const ALL: [AgentId; 5] = [
        AgentId::Navigator,
        AgentId::PatientInfo,
        AgentId::Appointment,
        AgentId::MedicalRecords,
        AgentId::Billing,
    ];

    /// Every identity the navigator may delegate to.
    pub const SPECIALISTS: [AgentId; 4] = [
        AgentId::PatientInfo,
        AgentId::Appointment,
        AgentId::MedicalRecords,
        AgentId::Billing,
    ];

    /// Position of this identity in [`AgentId::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Navigator => 0,
            Self::PatientInfo => 1,
            Self::Appointment => 2,
            Self::MedicalRecords => 3,
            Self::Billing => 4,
        }
    }

    pub fn is_specialist(self) -> bool {
        self != Self::Navigator
    }

    /// Name of the routing tool that delegates to this agent.
    ///
    /// `None` for the navigator, which is never a delegation target.
    pub fn routing_tool_name(self) -> Option<&'static str> {
        match self {
            Self::Navigator => None,
            Self::PatientInfo => Some("Patient_Information_Agent"),
            Self::Appointment => Some("Appointment_Scheduler"),
            Self::MedicalRecords => Some("Medical_Records_Agent"),
            Self::Billing => Some("Billing_And_Insurance_Agent"),
        }
    }

    /// Inverse of [`AgentId::routing_tool_name`].
    pub fn from_routing_tool(name: &str) -> Option<AgentId> {
        Self::SPECIALISTS
            .into_iter()
            .find(|id| id.routing_tool_name() == Some(name))
    }

    /// Stable snake_case key, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigator => "navigator",
            Self::PatientInfo => "patient_info",
            Self::Appointment => "appointment",
            Self::MedicalRecords => "medical_records",
            Self::Billing => "billing",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability flag that unlocks a tool for a specialist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Provider-native web search with grounding citations
    Search,
    /// The `generate_document` tool
    DocumentGeneration,
}

/// Where the orchestrator is within the current user turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Waiting for user input
    #[default]
    Idle,
    /// The navigator is classifying the message
    Routing,
    /// A specialist is generating the reply
    Executing,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Routing => write!(f, "routing"),
            Self::Executing => write!(f, "executing"),
        }
    }
}

/// Static description of one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: AgentId,

    /// Name shown next to the agent's messages
    pub display_name: String,

    /// Short role label (e.g. "Appointment Scheduler")
    pub role: String,

    /// One-line summary; doubles as the routing tool description
    pub description: String,

    /// Full system instruction for this agent
    pub persona_prompt: String,

    pub capabilities: BTreeSet<Capability>,
}

impl AgentDefinition {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Immutable catalog of agent definitions, one per [`AgentId`].
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    /// Indexed by [`AgentId::index`]
    definitions: Vec<AgentDefinition>,
}

static BUILTIN: OnceLock<AgentRegistry> = OnceLock::new();

impl AgentRegistry {
    /// The process-wide registry of built-in agents.
    pub fn builtin() -> &'static AgentRegistry {
        BUILTIN.get_or_init(|| AgentRegistry {
            definitions: AgentId::ALL.into_iter().map(builtin_definition).collect(),
        })
    }

    /// Build a registry from explicit definitions.
    ///
    /// Fails unless every identity appears exactly once.
    pub fn from_definitions(definitions: Vec<AgentDefinition>) -> Result<Self, Error> {
        let mut slots: Vec<Option<AgentDefinition>> = AgentId::ALL.iter().map(|_| None).collect();

        for definition in definitions {
            let slot = &mut slots[definition.id.index()];
            if slot.is_some() {
                return Err(Error::Config {
                    message: format!("duplicate agent definition for '{}'", definition.id),
                });
            }
            *slot = Some(definition);
        }

        let mut ordered = Vec::with_capacity(slots.len());
        for (id, slot) in AgentId::ALL.into_iter().zip(slots) {
            match slot {
                Some(definition) => ordered.push(definition),
                None => {
                    return Err(Error::Config {
                        message: format!("missing agent definition for '{id}'"),
                    });
                }
            }
        }

        Ok(Self {
            definitions: ordered,
        })
    }

    /// Look up the definition for an identity. Total.
    pub fn lookup(&self, id: AgentId) -> &AgentDefinition {
        &self.definitions[id.index()]
    }

    /// All definitions in presentation order (navigator first).
    pub fn all(&self) -> &[AgentDefinition] {
        &self.definitions
    }
}

/// The built-in definition for each identity.
pub fn builtin_definition(id: AgentId) -> AgentDefinition {
    let (display_name, role, description, persona_prompt, capabilities): (
        &str,
        &str,
        &str,
        &str,
        Vec<Capability>,
    ) = match id {
        AgentId::Navigator => (
            "Smart Navigator",
            "Central Navigator",
            "Analyses requests and connects you to the right specialist.",
            persona::NAVIGATOR_PERSONA,
            vec![],
        ),
        AgentId::PatientInfo => (
            "Patient Info",
            "Patient Information Agent",
            "Manages registration, updates details, and retrieves general patient information.",
            persona::PATIENT_INFO_PERSONA,
            vec![Capability::Search, Capability::DocumentGeneration],
        ),
        AgentId::Appointment => (
            "Appointments",
            "Appointment Scheduler",
            "Schedules, reschedules, and cancels appointments.",
            persona::APPOINTMENT_PERSONA,
            vec![Capability::Search],
        ),
        AgentId::MedicalRecords => (
            "Medical Records",
            "Medical Records Agent",
            "Retrieves and provides access to medical records, test results, and health history.",
            persona::MEDICAL_RECORDS_PERSONA,
            vec![Capability::DocumentGeneration],
        ),
        AgentId::Billing => (
            "Billing & Insurance",
            "Billing & Insurance Agent",
            "Handles questions about billing, insurance coverage, and payment options.",
            persona::BILLING_PERSONA,
            vec![Capability::Search, Capability::DocumentGeneration],
        ),
    };

    AgentDefinition {
        id,
        display_name: display_name.into(),
        role: role.into(),
        description: description.into(),
        persona_prompt: persona_prompt.into(),
        capabilities: capabilities.into_iter().collect(),
    }
}
