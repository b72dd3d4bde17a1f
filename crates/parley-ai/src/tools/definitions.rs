//! Tool descriptors and their per-backend declaration shapes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Parameter value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    /// Array of strings.
    StringArray,
    /// Free-form JSON object.
    Object,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::StringArray => "array",
            ParamType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Static description of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    fn required_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Flat JSON Schema object for the parameters.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut prop = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if param.kind == ParamType::StringArray {
                prop["items"] = json!({ "type": "string" });
            }
            if let Some(ref default) = param.default {
                prop["default"] = default.clone();
            }
            properties.insert(param.name.clone(), prop);
        }

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        let required = self.required_names();
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Nested typed schema in Gemini's OpenAPI subset: upper-case type
    /// names and no `default` keyword. `None` when no parameter survives,
    /// since Gemini rejects an OBJECT schema with empty properties.
    ///
    /// Free-form `object` parameters have no property list to declare, so
    /// they are left out of the declaration (and of `required`).
    pub fn gemini_schema(&self) -> Option<Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            if param.kind == ParamType::Object {
                warn!(
                    tool = %self.name,
                    param = %param.name,
                    "Gemini cannot declare a free-form object parameter, omitting it"
                );
                continue;
            }
            if param.required {
                required.push(param.name.as_str());
            }
            let mut prop = json!({
                "type": param.kind.json_type().to_uppercase(),
                "description": param.description,
            });
            if param.kind == ParamType::StringArray {
                prop["items"] = json!({ "type": "STRING" });
            }
            properties.insert(param.name.clone(), prop);
        }
        if properties.is_empty() {
            return None;
        }

        let mut schema = json!({
            "type": "OBJECT",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        Some(schema)
    }
}

/// Convert a tool spec to the OpenAI Chat Completions format.
pub fn to_openai_tool(tool: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.json_schema(),
        }
    })
}

/// Convert a tool spec to the Gemini function declaration format.
pub fn to_gemini_tool(tool: &ToolSpec) -> Value {
    let mut decl = json!({
        "name": tool.name,
        "description": tool.description,
    });
    if let Some(schema) = tool.gemini_schema() {
        decl["parameters"] = schema;
    }
    decl
}

/// Convert a tool spec to the Anthropic Messages API format.
pub fn to_anthropic_tool(tool: &ToolSpec) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.json_schema(),
    })
}
