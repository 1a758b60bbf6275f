//! Completion service request/response types and the client trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionResult;
use crate::message::{ContentBlock, Message, Role};
use crate::tool::{ToolChoice, ToolDescriptor};

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    /// Any value this crate does not know about yet
    #[serde(other)]
    Other,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StopReason::EndTurn => "end_turn",
            StopReason::MaxTokens => "max_tokens",
            StopReason::StopSequence => "stop_sequence",
            StopReason::ToolUse => "tool_use",
            StopReason::Other => "other",
        };
        f.write_str(name)
    }
}

/// Sampling and length options forwarded to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            system: None,
            temperature: None,
            top_p: None,
            stop_sequences: Vec::new(),
        }
    }
}

/// A single request to the completion service.
///
/// `messages` is a snapshot taken when the request is built; later changes to
/// the conversation do not affect a request already issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl CompletionRequest {
    /// Build a request. An empty tool list omits both `tools` and `tool_choice`.
    pub fn new(
        model: impl Into<String>,
        messages: Vec<Message>,
        tools: &[ToolDescriptor],
        tool_choice: ToolChoice,
        options: GenerationOptions,
    ) -> Self {
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (Some(tools.to_vec()), Some(tool_choice))
        };

        Self {
            model: model.into(),
            messages,
            tools,
            tool_choice,
            options,
        }
    }
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// A model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// An assistant response with the given content and stop reason.
    pub fn new(content: Vec<ContentBlock>, stop_reason: Option<StopReason>) -> Self {
        Self {
            id: None,
            model: None,
            role: Role::Assistant,
            content,
            stop_reason,
            usage: None,
        }
    }

    /// A plain text answer ending the turn.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ContentBlock::text(text)], Some(StopReason::EndTurn))
    }

    /// The response as a conversation message.
    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }

    pub fn has_tool_use(&self) -> bool {
        self.content.iter().any(ContentBlock::is_tool_use)
    }

    /// Text blocks joined with newlines.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue one completion request.
    async fn create(&self, request: &CompletionRequest) -> CompletionResult<CompletionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_tool_list_is_omitted() {
        let request = CompletionRequest::new(
            "model-x",
            vec![Message::user("hi")],
            &[],
            ToolChoice::Auto,
            GenerationOptions::default(),
        );

        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("tools").is_none());
        assert!(wire.get("tool_choice").is_none());
        assert_eq!(wire["max_tokens"], json!(4096));
        assert!(wire.get("stop_sequences").is_none());
    }

    #[test]
    fn test_tools_and_choice_are_sent_together() {
        let tools = vec![ToolDescriptor::new("add", json!({"type": "object"}))];
        let request = CompletionRequest::new(
            "model-x",
            vec![Message::user("hi")],
            &tools,
            ToolChoice::from_forced(Some("add")),
            GenerationOptions {
                system: Some("be brief".to_string()),
                ..GenerationOptions::default()
            },
        );

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["tools"][0]["name"], json!("add"));
        assert_eq!(wire["tool_choice"], json!({"type": "tool", "name": "add"}));
        assert_eq!(wire["system"], json!("be brief"));
    }

    #[test]
    fn test_response_decodes_unknown_stop_reason() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{"type": "text", "text": "hello"}],
            "stop_reason": "pause_turn"
        }))
        .unwrap();
        assert_eq!(response.stop_reason, Some(StopReason::Other));

        let response: CompletionResponse = serde_json::from_value(json!({
            "role": "assistant",
            "content": [],
            "stop_reason": null
        }))
        .unwrap();
        assert_eq!(response.stop_reason, None);
    }

    #[test]
    fn test_response_to_message() {
        let response = CompletionResponse::text("4");
        let message = response.to_message();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text_content(), "4");
        assert!(!response.has_tool_use());
    }
}
