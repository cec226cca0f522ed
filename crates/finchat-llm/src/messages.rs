//! Message types for LLM communication
//!
//! This module defines the conversation turns exchanged with the model. The
//! shape follows the Gemini `contents` array: every turn has a role
//! (`user` or `model`) and a list of parts, where a part is plain text, a
//! function call requested by the model, or the response to such a call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User turn (also carries function responses)
    User,
    /// Model turn
    Model,
}

/// A function invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the tool to invoke
    pub name: String,
    /// Model-generated arguments
    #[serde(default)]
    pub args: Value,
}

/// The result of a function invocation, fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Name of the tool that produced the result
    pub name: String,
    /// Result payload (always a JSON object)
    pub response: Value,
}

/// One part of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    /// Plain text content
    Text(String),
    /// Tool invocation requested by the model
    FunctionCall(FunctionCall),
    /// Tool result supplied back to the model
    FunctionResponse(FunctionResponse),
}

impl Part {
    /// Text part helper
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// A turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Ordered content parts
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a model message with text
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a user turn carrying the results of one round of tool calls
    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::User,
            parts: responses.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Create a model turn that requests tool calls
    pub fn function_calls(calls: Vec<FunctionCall>) -> Self {
        Self {
            role: Role::Model,
            parts: calls.into_iter().map(Part::FunctionCall).collect(),
        }
    }

    /// Concatenated text of all text parts, or `None` if there are none
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    /// Extract function calls from a model turn
    pub fn function_calls_requested(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Check if this message requests any tool calls
    pub fn has_function_calls(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::FunctionCall(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_model_message() {
        let msg = Message::model("Hi there");
        assert_eq!(msg.role, Role::Model);
        assert!(!msg.has_function_calls());
    }

    #[test]
    fn test_wire_shape_matches_gemini_contents() {
        let msg = Message::user("What is AAPL at?");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "parts": [{"text": "What is AAPL at?"}]})
        );

        let call = Message::function_calls(vec![FunctionCall {
            name: "getCurrentPrice".to_string(),
            args: json!({"stockSymbol": "AAPL"}),
        }]);
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "role": "model",
                "parts": [{"functionCall": {"name": "getCurrentPrice", "args": {"stockSymbol": "AAPL"}}}]
            })
        );
    }

    #[test]
    fn test_function_calls_extraction() {
        let msg = Message {
            role: Role::Model,
            parts: vec![
                Part::text("Let me check. "),
                Part::FunctionCall(FunctionCall {
                    name: "getStockNews".to_string(),
                    args: json!({"stockSymbol": "TSLA"}),
                }),
            ],
        };

        assert!(msg.has_function_calls());
        let calls = msg.function_calls_requested();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "getStockNews");
        assert_eq!(msg.text().as_deref(), Some("Let me check. "));
    }

    #[test]
    fn test_function_responses_are_user_turns() {
        let msg = Message::function_responses(vec![FunctionResponse {
            name: "getCurrentPrice".to_string(),
            response: json!({"dataFound": true, "currentPrice": 189.5}),
        }]);
        assert_eq!(msg.role, Role::User);
        assert!(msg.text().is_none());
    }
}
