//! Tool management and execution framework for finchat
//!
//! This crate provides a framework for defining the functions the model may
//! call during a chat turn and for looking them up by name.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
