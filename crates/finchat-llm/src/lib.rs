//! LLM provider abstraction layer for finchat
//!
//! This crate provides provider-agnostic abstractions for interacting with
//! a hosted language model. It includes:
//!
//! - Message types shaped like the Gemini `contents` array (`user`/`model` turns
//!   made of text, function-call and function-response parts)
//! - Completion request/response types, including the candidate metadata the
//!   chat envelope reports back to clients
//! - Tool definitions for function calling
//! - Provider trait for LLM implementations
//! - The Gemini provider (behind the `gemini` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{
    CandidateMetadata, CompletionRequest, CompletionResponse, StopReason, TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{FunctionCall, FunctionResponse, Message, Part, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "gemini")]
pub mod providers;
