//! Wire types for OpenAI-compatible `chat/completions` requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::message::{ChatMessage as Message, Role, ToolCall};

mod error;

pub use error::format_api_error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatToolDefinition>>,
}

#[derive(Deserialize)]
pub struct ChatResponseChoice {
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatResponseChoice>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: ChatToolCallFunction,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatToolCallFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct ChatToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ChatToolFunction,
}

#[derive(Serialize, Clone, Debug)]
pub struct ChatToolFunction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

fn function_kind() -> String {
    "function".to_string()
}

impl ChatToolDefinition {
    pub fn function(name: impl Into<String>, description: Option<String>, parameters: Value) -> Self {
        Self {
            kind: function_kind(),
            function: ChatToolFunction {
                name: name.into(),
                description,
                parameters,
            },
        }
    }
}

impl From<&ToolCall> for ChatToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: ChatToolCallFunction {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            },
        }
    }
}

impl From<ChatToolCall> for ToolCall {
    fn from(call: ChatToolCall) -> Self {
        ToolCall::new(call.id, call.function.name, call.function.arguments)
    }
}

/// Convert conversation messages into wire messages. App notices are dropped.
pub fn to_api_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .filter(|message| message.role.is_api())
        .map(|message| ChatMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            name: match message.role {
                Role::Tool => message.name.clone(),
                _ => None,
            },
            tool_call_id: message.tool_call_id.clone(),
            tool_calls: if message.tool_calls.is_empty() {
                None
            } else {
                Some(message.tool_calls.iter().map(ChatToolCall::from).collect())
            },
        })
        .collect()
}

impl ChatMessage {
    /// Convert a response message back into a conversation message.
    /// Providers always answer as the assistant.
    pub fn into_message(self) -> Message {
        let tool_calls: Vec<ToolCall> = self
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::from)
            .collect();
        let content = self.content.filter(|text| !text.is_empty());
        if tool_calls.is_empty() {
            Message::assistant(content.unwrap_or_default())
        } else {
            Message::assistant_tool_calls(content, tool_calls)
        }
    }
}
