//! Tool definition types for LLM function calling

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition for LLM provider
///
/// This describes a tool that the LLM can use, including its name,
/// description, and input schema in JSON Schema format. Providers translate
/// it into their own declaration format (Gemini: `functionDeclarations`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in ToolRegistry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helper module to build JSON schemas for tools
///
/// Only the subset of JSON Schema accepted by Gemini function declarations
/// is produced (no `default`, no `$ref`).
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use finchat_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "stockSymbol": schema::string("Ticker symbol, e.g. AAPL"),
    ///     }),
    ///     vec!["stockSymbol"],
    /// );
    /// assert_eq!(schema["required"][0], "stockSymbol");
    /// ```
    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Date property schema (`YYYY-MM-DD`)
    pub fn date(description: &str) -> Value {
        json!({
            "type": "string",
            "format": "date",
            "description": description,
        })
    }

    /// Number property schema
    pub fn number(description: &str) -> Value {
        json!({
            "type": "number",
            "description": description,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_creation() {
        let schema = schema::object(
            json!({
                "stockSymbol": schema::string("Ticker symbol"),
            }),
            vec!["stockSymbol"],
        );

        let tool = ToolDefinition::new("getCurrentPrice", "Latest close", schema.clone());
        assert_eq!(tool.name, "getCurrentPrice");
        assert_eq!(tool.description, "Latest close");
        assert_eq!(tool.input_schema, schema);
    }

    #[test]
    fn test_schema_builders() {
        assert_eq!(schema::string("s")["type"], "string");
        assert_eq!(schema::number("n")["type"], "number");
        assert_eq!(schema::integer("i")["type"], "integer");

        let date = schema::date("start");
        assert_eq!(date["type"], "string");
        assert_eq!(date["format"], "date");
    }
}
