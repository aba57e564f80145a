//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint.
//!
//! Features:
//! - `x-goog-api-key` header authentication
//! - System prompt as top-level `systemInstruction`
//! - Function declarations for routing and document tools
//! - Native Google Search grounding, surfaced as citations

use async_trait::async_trait;
use hospinav_core::error::ProviderError;
use hospinav_core::message::{TurnContext, TurnRole};
use hospinav_core::provider::*;
use hospinav_core::tool::{ToolCall, ToolDefinition, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    routing_model: String,
    generation_model: String,
    max_output_tokens: Option<u32>,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("routing_model", &self.routing_model)
            .field("generation_model", &self.generation_model)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    pub fn new(
        api_key: impl Into<String>,
        routing_model: impl Into<String>,
        generation_model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            routing_model: routing_model.into(),
            generation_model: generation_model.into(),
            max_output_tokens: None,
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: Option<u32>) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn system_instruction(text: &str) -> GeminiContent {
        GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text {
                text: text.to_string(),
            }],
        }
    }

    /// Convert the bounded turn context to Gemini contents.
    fn to_gemini_contents(turns: &TurnContext) -> Vec<GeminiContent> {
        turns
            .turns
            .iter()
            .map(|turn| GeminiContent {
                role: Some(
                    match turn.role {
                        TurnRole::User => "user",
                        TurnRole::Agent => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart::Text {
                    text: turn.text.clone(),
                }],
            })
            .collect()
    }

    fn to_function_declarations(tools: &[ToolDefinition]) -> Vec<GeminiFunctionDeclaration> {
        tools
            .iter()
            .map(|t| GeminiFunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect()
    }

    /// Convert tool specs to Gemini tool entries.
    ///
    /// Search becomes a `googleSearch` entry; all functions share one
    /// `functionDeclarations` entry.
    fn to_gemini_tools(tools: &[ToolSpec]) -> Vec<GeminiTool> {
        let mut result = Vec::new();
        let mut functions = Vec::new();

        for spec in tools {
            match spec {
                ToolSpec::WebSearch => result.push(GeminiTool::GoogleSearch {
                    google_search: serde_json::json!({}),
                }),
                ToolSpec::Function(definition) => functions.push(definition.clone()),
            }
        }

        if !functions.is_empty() {
            result.push(GeminiTool::Functions {
                function_declarations: Self::to_function_declarations(&functions),
            });
        }

        result
    }

    fn generation_config(&self, temperature: Option<f32>) -> Option<Value> {
        let mut config = serde_json::Map::new();
        if let Some(t) = temperature {
            config.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(max) = self.max_output_tokens {
            config.insert("maxOutputTokens".into(), serde_json::json!(max));
        }
        (!config.is_empty()).then_some(Value::Object(config))
    }

    fn classify_body(&self, request: &ClassifyRequest) -> Value {
        let mut body = serde_json::json!({
            "systemInstruction": Self::system_instruction(&request.instruction),
            "contents": [{
                "role": "user",
                "parts": [{"text": request.input}]
            }],
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!([GeminiTool::Functions {
                function_declarations: Self::to_function_declarations(&request.tools),
            }]);
        }

        if let Some(config) = self.generation_config(Some(request.temperature)) {
            body["generationConfig"] = config;
        }

        body
    }

    fn generate_body(&self, request: &GenerateRequest) -> Value {
        let mut body = serde_json::json!({
            "systemInstruction": Self::system_instruction(&request.instruction),
            "contents": Self::to_gemini_contents(&request.turns),
        });

        let tools = Self::to_gemini_tools(&request.tools);
        if !tools.is_empty() {
            body["tools"] = serde_json::json!(tools);
        }

        if let Some(config) = self.generation_config(None) {
            body["generationConfig"] = config;
        }

        body
    }

    async fn send(&self, model: &str, body: &Value) -> Result<GeminiResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Gemini API key".into(),
            ));
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(model.to_string()));
        }
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Self::parse_response(&text)
    }

    fn parse_response(body: &str) -> Result<GeminiResponse, ProviderError> {
        serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Gemini response: {e}"))
        })
    }

    /// Names of the functions the first candidate called, in order.
    fn selected_tools(response: GeminiResponse) -> Result<ClassifyResponse, ProviderError> {
        let candidate = Self::first_candidate(response)?;
        let selected_tools = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| match part {
                GeminiPart::FunctionCall { function_call } => Some(function_call.name),
                _ => None,
            })
            .collect();

        Ok(ClassifyResponse { selected_tools })
    }

    fn to_generate_response(response: GeminiResponse) -> Result<GenerateResponse, ProviderError> {
        let candidate = Self::first_candidate(response)?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                GeminiPart::Text { text: chunk } => text.push_str(&chunk),
                GeminiPart::FunctionCall { function_call } => {
                    tool_calls.push(ToolCall::new(function_call.name, function_call.args));
                }
                GeminiPart::Other(_) => {}
            }
        }

        let citations = candidate
            .grounding_metadata
            .map(|g| g.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .map(|web| RawCitation {
                title: web.title,
                url: web.uri,
            })
            .collect();

        Ok(GenerateResponse {
            text,
            tool_calls,
            citations,
        })
    }

    fn first_candidate(response: GeminiResponse) -> Result<GeminiCandidate, ProviderError> {
        if let Some(candidate) = response.candidates.into_iter().next() {
            return Ok(candidate);
        }
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".into());
        Err(ProviderError::InvalidResponse(format!(
            "Gemini returned no candidates: {reason}"
        )))
    }
}

#[async_trait]
impl hospinav_core::Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn classify(
        &self,
        request: ClassifyRequest,
    ) -> std::result::Result<ClassifyResponse, ProviderError> {
        let body = self.classify_body(&request);
        debug!(
            provider = "gemini",
            model = %self.routing_model,
            tools = request.tools.len(),
            "Sending classification request"
        );

        let response = self.send(&self.routing_model, &body).await?;
        Self::selected_tools(response)
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, ProviderError> {
        let body = self.generate_body(&request);
        debug!(
            provider = "gemini",
            model = %self.generation_model,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Sending generation request"
        );

        let response = self.send(&self.generation_model, &body).await?;
        Self::to_generate_response(response)
    }
}

// ── Gemini wire types ──

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    /// Part kinds this client never sends and ignores on receipt
    Other(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum GeminiTool {
    GoogleSearch {
        #[serde(rename = "googleSearch")]
        google_search: Value,
    },
    Functions {
        #[serde(rename = "functionDeclarations")]
        function_declarations: Vec<GeminiFunctionDeclaration>,
    },
}

#[derive(Debug, Clone, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiGroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiGroundingChunk {
    web: Option<GeminiWebSource>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiWebSource {
    uri: Option<String>,
    title: Option<String>,
}
