//! Tool descriptors and the tool-call wire shapes.
//!
//! A [`CatalogEntry`] is what the tool gateway advertises; a [`ToolDescriptor`]
//! is what the completion service is told about. The translation between the
//! two is one-to-one and keeps the input schema verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC method used for tool invocation.
pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// A tool as described to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<CatalogEntry> for ToolDescriptor {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            name: entry.name,
            description: entry.description,
            input_schema: entry.input_schema,
        }
    }
}

/// A tool as advertised by the tool gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// How the model may pick tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether and which tool to call
    Auto,
    /// The model must call the named tool
    Tool { name: String },
}

impl ToolChoice {
    /// Forced tool when a name is configured, automatic otherwise.
    pub fn from_forced(name: Option<&str>) -> Self {
        match name {
            Some(name) => ToolChoice::Tool {
                name: name.to_string(),
            },
            None => ToolChoice::Auto,
        }
    }
}

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a JSON object; non-object input is wrapped as `{"input": …}`.
    pub fn arguments_object(&self) -> Map<String, Value> {
        match &self.arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other.clone());
                map
            }
        }
    }

    /// The full request envelope as sent to the gateway.
    pub fn to_request(&self) -> Value {
        serde_json::json!({
            "method": TOOLS_CALL_METHOD,
            "params": {
                "name": self.name,
                "arguments": self.arguments,
            }
        })
    }
}

/// Result payload of a `tools/call` request.
///
/// `content` is either a single content item or a list of them; each item
/// carries a `type` discriminator and a payload keyed by that type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Value,
}

impl ToolOutput {
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    /// A single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(serde_json::json!({ "type": "text", "text": text.into() }))
    }
}
