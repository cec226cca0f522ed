//! Tool trait definition

use async_trait::async_trait;
use finchat_core::Result;
use finchat_llm::ToolDefinition;
use serde_json::Value;

/// Trait for tools the model can call
///
/// Each tool provides a name, a description and a JSON schema for its
/// arguments. The name is what the model emits in a function call, so it must
/// be unique within a [`ToolRegistry`](crate::ToolRegistry).
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the arguments the model supplied
    ///
    /// Tools that talk to an upstream service should report "no data" inside
    /// the returned value rather than failing; an `Err` here is reserved for
    /// things the model cannot recover from.
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description helps the model decide when to call the tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "stockSymbol": { "type": "string" }
    ///     },
    ///     "required": ["stockSymbol"]
    /// });
    /// assert_eq!(schema["required"][0], "stockSymbol");
    /// ```
    fn input_schema(&self) -> Value;

    /// Build the declaration sent to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}
