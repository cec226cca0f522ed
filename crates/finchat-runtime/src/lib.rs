//! Chat runtime for finchat
//!
//! This crate provides the pieces that turn one chat request into one model
//! answer: the [`AgentExecutor`] tool-calling loop, the per-client
//! [`SessionStore`] and the [`ConversationBridge`] that ties them together and
//! produces the response envelope.

pub mod bridge;
pub mod envelope;
pub mod executor;
pub mod session;

// Re-export key types
pub use bridge::{ChatReply, ChatTurn, ConversationBridge, Sender, translate_history};
pub use envelope::ChatEnvelope;
pub use executor::{
    AgentExecutor, AgentExecutorBuilder, DEFAULT_MODEL, ExecutorConfig, ExecutorEventHandler,
    TurnOutcome,
};
pub use session::{ChatSession, SessionGuard, SessionStore};
