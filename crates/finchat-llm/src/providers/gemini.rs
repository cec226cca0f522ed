//! Google Gemini provider implementation
//!
//! This module implements the LLMProvider trait for the Gemini
//! `generateContent` REST endpoint.
//! See: https://ai.google.dev/api/generate-content
//!
//! # Example
//!
//! ```no_run
//! use finchat_llm::{CompletionRequest, LLMProvider, Message};
//! use finchat_llm::providers::{GeminiConfig, GeminiProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads `geminiAPI` (or `GEMINI_API_KEY`) from the environment
//!     let provider = GeminiProvider::with_config(GeminiConfig::from_env()?)?;
//!
//!     let request = CompletionRequest::builder("gemini-2.5-flash")
//!         .add_message(Message::user("What does EPS stand for?"))
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.message.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

use crate::{
    CandidateMetadata, CompletionRequest, CompletionResponse, FunctionCall, LLMError,
    LLMProvider, Message, Part, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables consulted for the API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["geminiAPI", "GEMINI_API_KEY"];

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default: "https://generativelanguage.googleapis.com/v1beta")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `geminiAPI`, falling back to `GEMINI_API_KEY`.
    /// Optionally reads the base URL from `GEMINI_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                LLMError::ConfigurationError(format!(
                    "Gemini API key not set (expected one of: {})",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })?;

        let api_base = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.to_string());

        Ok(Self {
            api_key,
            api_base,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Gemini API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(GeminiConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Strip a "models/" or "gemini/" prefix so both config styles work
    fn normalize_model(model: &str) -> &str {
        model
            .strip_prefix("models/")
            .or_else(|| model.strip_prefix("gemini/"))
            .unwrap_or(model)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(
        skip(self, request),
        fields(model = %request.model, messages = request.messages.len())
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = Self::normalize_model(&request.model).to_string();
        debug!("Sending request to Gemini API at {}", self.config.api_base);

        let body = build_request(request);

        let response = self
            .client
            .post(format!(
                "{}/models/{model}:generateContent",
                self.config.api_base
            ))
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Handle errors
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!(status = %status, body = %error_text, "Gemini API error");

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let parsed = parse_response(gemini_response)?;

        debug!(
            "Received response - finish_reason: {}, tokens: {}/{}",
            parsed.candidate.finish_reason,
            parsed.usage.prompt_tokens,
            parsed.usage.candidates_tokens
        );

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// Gemini-specific request types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

// ============================================================================
// Gemini-specific response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    index: u32,
    #[serde(default)]
    safety_ratings: Vec<Value>,
    #[serde(default)]
    token_count: usize,
    #[serde(default)]
    grounding_attributions: Vec<Value>,
    avg_logprobs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    cached_content_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// Build the Gemini request body from our generic request
fn build_request(request: CompletionRequest) -> GeminiRequest {
    GeminiRequest {
        contents: request.messages,
        system_instruction: request.system.map(|text| GeminiSystemInstruction {
            parts: vec![Part::Text(text)],
        }),
        tools: request
            .tools
            .as_deref()
            .map(convert_tools)
            .unwrap_or_default(),
        generation_config: GeminiGenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
            stop_sequences: request.stop_sequences,
        },
    }
}

/// Convert tool definitions to a single Gemini tool with function declarations
fn convert_tools(tools: &[ToolDefinition]) -> Vec<GeminiTool> {
    if tools.is_empty() {
        return Vec::new();
    }

    vec![GeminiTool {
        function_declarations: tools
            .iter()
            .map(|tool| GeminiFunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            })
            .collect(),
    }]
}

/// Parse a Gemini response into our format
fn parse_response(response: GeminiResponse) -> Result<CompletionResponse> {
    let usage = response.usage_metadata.unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(LLMError::Blocked(reason));
    };

    let mut parts = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(text) = part.text {
            if !text.is_empty() {
                parts.push(Part::Text(text));
            }
        }
        if let Some(call) = part.function_call {
            parts.push(Part::FunctionCall(FunctionCall {
                name: call.name,
                args: call.args.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            }));
        }
    }

    let finish_reason = candidate.finish_reason.unwrap_or_else(|| "STOP".to_string());
    let has_calls = parts.iter().any(|p| matches!(p, Part::FunctionCall(_)));
    let stop_reason = if has_calls {
        StopReason::ToolUse
    } else {
        map_stop_reason(&finish_reason)
    };

    Ok(CompletionResponse {
        message: Message {
            role: Role::Model,
            parts,
        },
        stop_reason,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            candidates_tokens: usage.candidates_token_count,
            cached_content_tokens: usage.cached_content_token_count,
        },
        candidate: CandidateMetadata {
            finish_reason,
            index: candidate.index,
            safety_ratings: candidate.safety_ratings,
            token_count: candidate.token_count,
            grounding_attributions: candidate.grounding_attributions,
            avg_logprobs: candidate.avg_logprobs,
        },
    })
}

/// Map Gemini finish reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "STOP" => StopReason::EndTurn,
        "MAX_TOKENS" => StopReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            debug!("Candidate withheld by Gemini safety systems: {}", reason);
            StopReason::Safety
        }
        _ => {
            debug!("Unknown finish reason: {}", reason);
            StopReason::Other
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FunctionResponse;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, DEFAULT_GEMINI_API_BASE);
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = GeminiProvider::new("   ");
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = GeminiConfig::new("k")
            .with_api_base("http://localhost:9000/v1beta/")
            .with_timeout(30);
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_normalize_model() {
        assert_eq!(
            GeminiProvider::normalize_model("models/gemini-2.5-flash"),
            "gemini-2.5-flash"
        );
        assert_eq!(
            GeminiProvider::normalize_model("gemini/gemini-2.0-flash"),
            "gemini-2.0-flash"
        );
        assert_eq!(
            GeminiProvider::normalize_model("gemini-2.5-pro"),
            "gemini-2.5-pro"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest::builder("gemini-2.5-flash")
            .add_message(Message::user("Price of AAPL?"))
            .add_message(Message::function_responses(vec![FunctionResponse {
                name: "getCurrentPrice".to_string(),
                response: json!({"dataFound": true, "currentPrice": 190.1}),
            }]))
            .system("Finance only")
            .tools(vec![ToolDefinition::new(
                "getCurrentPrice",
                "Latest close",
                json!({"type": "object", "properties": {}}),
            )])
            .max_tokens(512)
            .build();

        let body = serde_json::to_value(build_request(request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Finance only");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Price of AAPL?");
        assert_eq!(
            body["contents"][1]["parts"][0]["functionResponse"]["name"],
            "getCurrentPrice"
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "getCurrentPrice"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_no_tools_omits_tools_field() {
        let request = CompletionRequest::builder("gemini-2.5-flash")
            .add_message(Message::user("hi"))
            .build();
        let body = serde_json::to_value(build_request(request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Apple closed at $190."}], "role": "model"},
                "finishReason": "STOP",
                "index": 0,
                "safetyRatings": [{"category": "HARM_CATEGORY_HARASSMENT", "probability": "NEGLIGIBLE"}],
                "avgLogprobs": -0.12
            }],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 8, "totalTokenCount": 128}
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let parsed = parse_response(response).unwrap();

        assert_eq!(parsed.stop_reason, StopReason::EndTurn);
        assert_eq!(parsed.message.text().as_deref(), Some("Apple closed at $190."));
        assert_eq!(parsed.usage.total(), 128);
        assert_eq!(parsed.candidate.finish_reason, "STOP");
        assert_eq!(parsed.candidate.safety_ratings.len(), 1);
        assert_eq!(parsed.candidate.avg_logprobs, Some(-0.12));
    }

    #[test]
    fn test_parse_function_call_response() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "parts": [{"functionCall": {"name": "getCurrentPrice", "args": {"stockSymbol": "MSFT"}}}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let parsed = parse_response(response).unwrap();

        assert_eq!(parsed.stop_reason, StopReason::ToolUse);
        let calls = parsed.message.function_calls_requested();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "getCurrentPrice");
        assert_eq!(calls[0].args["stockSymbol"], "MSFT");
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let result = parse_response(response);
        assert!(matches!(result, Err(LLMError::Blocked(reason)) if reason == "SAFETY"));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("STOP"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("MAX_TOKENS"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("SAFETY"), StopReason::Safety);
        assert_eq!(map_stop_reason("RECITATION"), StopReason::Safety);
        assert_eq!(map_stop_reason("OTHER"), StopReason::Other);
    }
}
