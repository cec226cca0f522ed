//! Conversation bridge between chat clients and the model
//!
//! A client sends its own view of the conversation with every request. The
//! bridge translates that history into model turns, overwrites the session's
//! working history with it, runs one executor turn and wraps the answer in a
//! [`ChatEnvelope`]. Failures never escape: they become an apology envelope.

use crate::envelope::ChatEnvelope;
use crate::executor::AgentExecutor;
use crate::session::SessionStore;
use finchat_llm::{Message, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Who wrote a client-side chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    fn role(self) -> Role {
        match self {
            Sender::User => Role::User,
            Sender::Bot => Role::Model,
        }
    }
}

/// A chat turn as the client stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub sender: Sender,
    pub content: String,
}

impl ChatTurn {
    /// Parse a client history entry
    ///
    /// Accepts `{sender, content}` and `{sender, message}`; `content` wins
    /// when both are present. Anything else yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let sender = match entry.get("sender")?.as_str()? {
            "user" => Sender::User,
            "bot" => Sender::Bot,
            _ => return None,
        };
        let content = entry
            .get("content")
            .and_then(Value::as_str)
            .or_else(|| entry.get("message").and_then(Value::as_str))?;

        Some(Self {
            sender,
            content: content.to_string(),
        })
    }

    /// The model-side turn for this entry
    pub fn to_message(&self) -> Message {
        let mut message = Message::user(self.content.clone());
        message.role = self.sender.role();
        message
    }
}

/// Translate client history into model turns, dropping unrecognised entries
pub fn translate_history(history: &[Value]) -> Vec<Message> {
    history
        .iter()
        .filter_map(ChatTurn::from_value)
        .map(|turn| turn.to_message())
        .collect()
}

/// Result of one chat request
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Session the turn ran in
    pub session_id: String,

    /// Response body
    pub envelope: ChatEnvelope,
}

/// Bridges chat requests to the executor
pub struct ConversationBridge {
    executor: Arc<AgentExecutor>,
    sessions: Arc<SessionStore>,
}

impl ConversationBridge {
    /// Create a bridge over an executor and a session store
    pub fn new(executor: Arc<AgentExecutor>, sessions: Arc<SessionStore>) -> Self {
        Self { executor, sessions }
    }

    /// The session store backing this bridge
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// The executor used for turns
    pub fn executor(&self) -> &Arc<AgentExecutor> {
        &self.executor
    }

    /// Handle one chat message
    ///
    /// `message` must already be validated as non-blank by the caller.
    #[instrument(skip(self, message, history), fields(history_len = history.len()))]
    pub async fn handle_chat(
        &self,
        session_id: Option<&str>,
        message: &str,
        history: &[Value],
    ) -> ChatReply {
        let (session_id, mut session) = self.sessions.acquire(session_id).await;

        let translated = translate_history(history);
        info!(
            session_id = %session_id,
            received = history.len(),
            kept = translated.len(),
            "Starting chat turn"
        );
        session.history = translated;

        let envelope = match self
            .executor
            .run_with_history(session.history.clone(), message)
            .await
        {
            Ok(outcome) => {
                session.history.push(Message::user(message));
                session.history.push(Message::model(outcome.text.clone()));
                ChatEnvelope::from_response(&outcome.response, outcome.text)
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Chat turn failed");
                ChatEnvelope::apology(e)
            }
        };

        session.touch();
        ChatReply {
            session_id,
            envelope,
        }
    }
}
