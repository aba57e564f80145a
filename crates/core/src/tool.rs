//! Tool catalog: declarative descriptions of what an agent may invoke.
//!
//! Tools here are never executed locally. The navigator selects one routing
//! tool per turn, and specialists may request `generate_document`, whose
//! effect is surfaced as an artifact name on the outgoing message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::{AgentId, AgentRegistry};

/// Name of the document-generation tool.
pub const DOCUMENT_TOOL_NAME: &str = "generate_document";

/// Document type used when a `generate_document` call omits or garbles it.
pub const DEFAULT_DOCUMENT_TYPE: &str = "Document";

/// A function the model may call, described by a JSON Schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

/// A tool offered to a specialist for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolSpec {
    /// Provider-native web search; results come back as citations
    WebSearch,
    /// A declared function
    Function(ToolDefinition),
}

/// A raw tool invocation as returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the invoked tool
    pub name: String,

    /// Arguments as a JSON value (usually an object)
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The routing tool that delegates to `id`, if `id` is a specialist.
pub fn routing_tool(registry: &AgentRegistry, id: AgentId) -> Option<ToolDefinition> {
    let name = id.routing_tool_name()?;
    Some(ToolDefinition {
        name: name.to_string(),
        description: registry.lookup(id).description.clone(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    })
}

/// Every routing tool, one per specialist, in registry order.
pub fn routing_catalog(registry: &AgentRegistry) -> Vec<ToolDefinition> {
    AgentId::SPECIALISTS
        .into_iter()
        .filter_map(|id| routing_tool(registry, id))
        .collect()
}

/// Declaration of the `generate_document` tool.
pub fn document_tool() -> ToolDefinition {
    ToolDefinition {
        name: DOCUMENT_TOOL_NAME.into(),
        description: "Creates an official document (PDF/form) for the user, such as a medical record or an invoice.".into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "documentType": {
                    "type": "string",
                    "description": "Kind of document (e.g. Invoice, Medical Record, Registration Form)"
                },
                "format": {
                    "type": "string",
                    "description": "File format (PDF, DOCX, PPTX)"
                }
            },
            "required": ["documentType"]
        }),
    }
}

/// Arguments of a `generate_document` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub document_type: String,
    /// `None` when the call did not name a usable format
    pub format: Option<String>,
}

impl DocumentRequest {
    /// The format to use, falling back to `default_format`.
    pub fn effective_format<'a>(&'a self, default_format: &'a str) -> &'a str {
        self.format.as_deref().unwrap_or(default_format)
    }

    /// File name of the produced artifact, e.g. `Invoice.pdf`.
    pub fn artifact_name(&self, default_format: &str) -> String {
        format!(
            "{}.{}",
            self.document_type,
            self.effective_format(default_format).to_lowercase()
        )
    }
}

/// A provider tool call decoded into a typed variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    GenerateDocument(DocumentRequest),
    /// Anything the executor does not know how to surface
    Unrecognized { name: String },
}

impl ToolInvocation {
    /// Decode a raw call. Missing or wrong-typed fields fall back to defaults.
    pub fn decode(call: &ToolCall) -> Self {
        if call.name != DOCUMENT_TOOL_NAME {
            return Self::Unrecognized {
                name: call.name.clone(),
            };
        }

        let document_type =
            non_empty_str(&call.arguments, "documentType").unwrap_or(DEFAULT_DOCUMENT_TYPE);
        let format = non_empty_str(&call.arguments, "format");

        Self::GenerateDocument(DocumentRequest {
            document_type: document_type.to_string(),
            format: format.map(str::to_string),
        })
    }
}

fn non_empty_str<'a>(arguments: &'a Value, key: &str) -> Option<&'a str> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
