//! MCP tool definitions.

use serde::Serialize;
use serde_json::json;

/// Tool names as constants for dispatch matching.
pub mod tool_names {
    pub const HEAL: &str = "heal";
    pub const COUNT: &str = "count";
    pub const VERSION: &str = "version";
}

/// A tool advertised through `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// All tool definitions exposed by the server.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            tool_names::HEAL,
            "Heal a labelhash to recover the original label text",
            json!({
                "type": "object",
                "properties": {
                    "labelhash": {
                        "type": "string",
                        "description": "The labelhash to heal (hex string starting with 0x)",
                        "pattern": "^0x[a-fA-F0-9]{64}$"
                    },
                    "labelSetId": {
                        "type": "string",
                        "description": "Optional label set ID to use for healing"
                    },
                    "labelSetVersion": {
                        "type": "string",
                        "description": "Optional label set version (non-negative integer as string)"
                    }
                },
                "required": ["labelhash"]
            }),
        ),
        ToolDefinition::new(
            tool_names::COUNT,
            "Get the total count of healable labels in the database",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        ToolDefinition::new(
            tool_names::VERSION,
            "Get version information about the server and database schema",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_tools_are_defined() {
        let tools = definitions();
        assert_eq!(tools.len(), 3);
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![tool_names::HEAL, tool_names::COUNT, tool_names::VERSION]
        );
    }

    #[test]
    fn heal_schema_requires_labelhash() {
        let tools = definitions();
        let heal = &tools[0];
        assert_eq!(heal.input_schema["required"][0], "labelhash");
    }
}
