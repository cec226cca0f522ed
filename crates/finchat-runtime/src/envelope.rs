//! Chat response envelope
//!
//! The JSON body returned by `POST /chat`. It mirrors the candidate list of
//! a generateContent response, reduced to a single text part, with snake_case
//! keys.

use finchat_llm::{CompletionResponse, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Finish reason reported when the turn failed before the model answered
pub const FAILED_FINISH_REASON: &str = "OTHER";

/// Response body for a chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub candidates: Vec<Candidate>,
    pub usage_metadata: UsageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: CandidateContent,
    pub finish_reason: String,
    pub index: u32,
    pub safety_ratings: Vec<Value>,
    pub token_count: usize,
    pub grounding_attributions: Vec<Value>,
    pub avg_logprobs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    pub parts: Vec<TextPart>,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_token_count: usize,
    pub candidates_token_count: usize,
    pub total_token_count: usize,
    pub cached_content_token_count: usize,
}

impl From<TokenUsage> for UsageMetadata {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_token_count: usage.prompt_tokens,
            candidates_token_count: usage.candidates_tokens,
            total_token_count: usage.total(),
            cached_content_token_count: usage.cached_content_tokens,
        }
    }
}

impl ChatEnvelope {
    /// Envelope for the model response that ended a turn
    pub fn from_response(response: &CompletionResponse, text: impl Into<String>) -> Self {
        let meta = &response.candidate;
        Self {
            candidates: vec![Candidate {
                content: CandidateContent::model_text(text),
                finish_reason: meta.finish_reason.clone(),
                index: meta.index,
                safety_ratings: meta.safety_ratings.clone(),
                token_count: meta.token_count,
                grounding_attributions: meta.grounding_attributions.clone(),
                avg_logprobs: meta.avg_logprobs,
            }],
            usage_metadata: response.usage.into(),
        }
    }

    /// Well-formed envelope carrying an apology for a failed turn
    pub fn apology(error: impl std::fmt::Display) -> Self {
        Self {
            candidates: vec![Candidate {
                content: CandidateContent::model_text(format!(
                    "Sorry, I couldn't process that request: {error}"
                )),
                finish_reason: FAILED_FINISH_REASON.to_string(),
                index: 0,
                safety_ratings: Vec::new(),
                token_count: 0,
                grounding_attributions: Vec::new(),
                avg_logprobs: None,
            }],
            usage_metadata: UsageMetadata::default(),
        }
    }

    /// Text of the first candidate
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
    }
}

impl CandidateContent {
    fn model_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![TextPart { text: text.into() }],
            role: "model".to_string(),
        }
    }
}
