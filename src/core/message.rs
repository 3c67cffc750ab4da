use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    AppInfo,
    AppError,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::AppInfo => "app/info",
            Role::AppError => "app/error",
        }
    }

    /// Whether messages with this role are part of the provider conversation.
    /// App notices only live in the transcript.
    pub fn is_api(self) -> bool {
        !self.is_app()
    }

    pub fn is_app(self) -> bool {
        matches!(self, Role::AppInfo | Role::AppError)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            "app/info" => Ok(Role::AppInfo),
            "app/error" => Ok(Role::AppError),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// Raw JSON object text as produced by the model.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: ToolCallFunction,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            function: ToolCallFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Parse the argument text into a JSON object. Blank arguments are treated
    /// as "no arguments".
    pub fn parsed_arguments(&self) -> Result<Option<Map<String, Value>>, String> {
        let raw = self.function.arguments.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) if map.is_empty() => Ok(None),
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(Value::Null) => Ok(None),
            Ok(other) => Err(format!("expected a JSON object, got {other}")),
            Err(err) => Err(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(tool_name.into()),
        }
    }

    pub fn app_info(content: impl Into<String>) -> Self {
        Self::new(Role::AppInfo, content)
    }

    pub fn app_error(content: impl Into<String>) -> Self {
        Self::new(Role::AppError, content)
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_roles_are_not_sent_to_providers() {
        assert!(!Role::AppInfo.is_api());
        assert!(!Role::AppError.is_api());
        assert!(Role::Tool.is_api());
        assert!(Role::System.is_api());
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("app/unknown").is_err());
        assert_eq!(Role::try_from("tool"), Ok(Role::Tool));
    }

    #[test]
    fn roles_serialize_as_strings() {
        let message = ChatMessage::app_error("boom");
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["role"], "app/error");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn tool_result_carries_call_id_and_name() {
        let message = ChatMessage::tool_result("call-1", "now", "12:00");
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(message.name.as_deref(), Some("now"));
        assert_eq!(message.text(), "12:00");
    }

    #[test]
    fn parsed_arguments_accepts_objects_and_blank() {
        let call = ToolCall::new("1", "now", r#"{"tz":"UTC"}"#);
        let args = call.parsed_arguments().expect("object").expect("some");
        assert_eq!(args["tz"], "UTC");

        assert_eq!(ToolCall::new("2", "now", "  ").parsed_arguments(), Ok(None));
        assert_eq!(ToolCall::new("3", "now", "{}").parsed_arguments(), Ok(None));
    }

    #[test]
    fn parsed_arguments_rejects_non_objects() {
        assert!(ToolCall::new("1", "now", "[1,2]").parsed_arguments().is_err());
        assert!(ToolCall::new("1", "now", "{oops").parsed_arguments().is_err());
    }
}
