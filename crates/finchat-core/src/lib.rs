//! Core types for finchat
//!
//! This crate defines the error type shared by every boundary in the
//! workspace: tool functions, the tool-calling executor, the conversation
//! bridge and the HTTP handlers all speak [`Error`].

pub mod error;

pub use error::{Error, Result};
