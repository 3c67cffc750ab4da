//! The per-turn tool-calling loop and the engine the UI talks to.

use crate::core::config::ChatConfig;
use crate::core::constants::MAX_TOOL_ROUNDS;
use crate::core::message::{ChatMessage, Role};
use crate::core::providers::{ChatError, Provider, ProviderFactory};
use crate::core::templates::{render_system_prompt, PromptVars};
use crate::mcp::ToolHost;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Snapshot of a session taken when the user sends a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub session_id: String,
    pub model: String,
    pub system_prompt: Option<String>,
    /// Conversation so far, ending with the new user message.
    pub messages: Vec<ChatMessage>,
}

#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Run one turn and return the messages it produced.
    async fn chat(&self, turn: ChatTurn) -> Result<Vec<ChatMessage>, ChatError>;
}

/// Drives a provider and a tool host until the model answers in text.
pub struct McpToolChat {
    provider: Arc<dyn Provider>,
    tools: Arc<dyn ToolHost>,
    system_prompt: Option<String>,
    max_rounds: usize,
}

impl McpToolChat {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolHost>,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            system_prompt,
            max_rounds: MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<Vec<ChatMessage>, ChatError> {
        let mut conversation: Vec<ChatMessage> = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = self.system_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            conversation.push(ChatMessage::system(prompt));
        }
        conversation.extend(
            messages
                .iter()
                .filter(|message| message.role.is_api() && message.role != Role::System)
                .cloned(),
        );
        let history_len = conversation.len();
        let tool_specs = self.tools.tool_specs();

        for round in 1..=self.max_rounds {
            let reply = self.provider.complete(&conversation, &tool_specs).await?;
            if !reply.has_tool_calls() {
                conversation.push(reply);
                return Ok(conversation.split_off(history_len));
            }

            debug!(round, calls = reply.tool_calls.len(), "Model requested tools");
            let calls = reply.tool_calls.clone();
            conversation.push(reply);
            for call in calls {
                let name = call.function.name.clone();
                let outcome = match call.parsed_arguments() {
                    Ok(arguments) => self.tools.call_tool(&name, arguments).await,
                    Err(err) => Err(format!("Invalid arguments for tool '{name}': {err}")),
                };
                let content = match outcome {
                    Ok(text) => text,
                    Err(err) => {
                        info!(tool = %name, error = %err, "Tool call failed");
                        format!("Error: {err}")
                    }
                };
                conversation.push(ChatMessage::tool_result(&call.id, &name, content));
            }
        }

        Err(ChatError::ToolLoopLimit(self.max_rounds))
    }
}

/// Production engine: resolves the provider for the turn's model and runs
/// the tool loop against the shared tool host.
pub struct McpChatEngine {
    config: ChatConfig,
    factory: ProviderFactory,
    tools: Arc<dyn ToolHost>,
}

impl McpChatEngine {
    pub fn new(config: ChatConfig, factory: ProviderFactory, tools: Arc<dyn ToolHost>) -> Self {
        Self {
            config,
            factory,
            tools,
        }
    }
}

#[async_trait]
impl ChatEngine for McpChatEngine {
    async fn chat(&self, turn: ChatTurn) -> Result<Vec<ChatMessage>, ChatError> {
        let model_config = self
            .config
            .model(&turn.model)
            .ok_or_else(|| ChatError::UnknownModel(turn.model.clone()))?;
        let provider = self.factory.get_provider(&turn.model, model_config)?;

        let tool_names = self
            .tools
            .tool_specs()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        let vars = PromptVars::new(&turn.model, tool_names);
        let system_prompt = turn
            .system_prompt
            .as_deref()
            .map(|source| render_system_prompt(source, &vars));

        info!(session = %turn.session_id, model = %turn.model, "Starting chat turn");
        McpToolChat::new(provider, Arc::clone(&self.tools), system_prompt)
            .chat(&turn.messages)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ModelConfig, ProviderKind};
    use crate::core::message::ToolCall;
    use crate::mcp::{NoTools, ToolSpec};
    use serde_json::{json, Map, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records what it was sent.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<ChatMessage>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<ChatMessage>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<Vec<ChatMessage>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<ChatMessage, ChatError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ChatError::EmptyResponse)
        }
    }

    struct WeatherTools;

    #[async_trait]
    impl ToolHost for WeatherTools {
        fn tool_specs(&self) -> Vec<ToolSpec> {
            vec![ToolSpec {
                name: "get_weather".into(),
                description: None,
                input_schema: json!({"type": "object"}),
            }]
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: Option<Map<String, Value>>,
        ) -> Result<String, String> {
            match (name, arguments) {
                ("get_weather", Some(args)) => Ok(format!("Sunny in {}", args["city"].as_str().unwrap_or("?"))),
                ("get_weather", None) => Err("city is required".into()),
                (other, _) => Err(format!("Unknown tool: {other}")),
            }
        }
    }

    fn weather_call(id: &str, args: &str) -> ChatMessage {
        ChatMessage::assistant_tool_calls(None, vec![ToolCall::new(id, "get_weather", args)])
    }

    #[tokio::test]
    async fn plain_answer_returns_single_message() {
        let provider = ScriptedProvider::new(vec![ChatMessage::assistant("Hello!")]);
        let chat = McpToolChat::new(provider.clone(), Arc::new(NoTools), Some("Be nice".into()));

        let new_messages = chat.chat(&[ChatMessage::user("hi")]).await.expect("chat");
        assert_eq!(new_messages, vec![ChatMessage::assistant("Hello!")]);

        let sent = &provider.requests()[0];
        assert_eq!(sent[0], ChatMessage::system("Be nice"));
        assert_eq!(sent[1], ChatMessage::user("hi"));
    }

    #[tokio::test]
    async fn tool_results_are_fed_back_to_the_model() {
        let provider = ScriptedProvider::new(vec![
            weather_call("c1", r#"{"city":"Paris"}"#),
            ChatMessage::assistant("It is sunny in Paris."),
        ]);
        let chat = McpToolChat::new(provider.clone(), Arc::new(WeatherTools), None);

        let new_messages = chat
            .chat(&[ChatMessage::user("Weather in Paris?")])
            .await
            .expect("chat");
        assert_eq!(new_messages.len(), 3);
        assert!(new_messages[0].has_tool_calls());
        assert_eq!(
            new_messages[1],
            ChatMessage::tool_result("c1", "get_weather", "Sunny in Paris")
        );
        assert_eq!(new_messages[2].text(), "It is sunny in Paris.");

        let second_request = &provider.requests()[1];
        assert_eq!(second_request.len(), 3);
        assert_eq!(second_request[2].role, Role::Tool);
    }

    #[tokio::test]
    async fn tool_failures_become_tool_messages() {
        let provider = ScriptedProvider::new(vec![
            ChatMessage::assistant_tool_calls(
                None,
                vec![
                    ToolCall::new("c1", "get_weather", "{not json"),
                    ToolCall::new("c2", "get_weather", ""),
                    ToolCall::new("c3", "launch_rocket", "{}"),
                ],
            ),
            ChatMessage::assistant("Sorry, I could not check."),
        ]);
        let chat = McpToolChat::new(provider, Arc::new(WeatherTools), None);

        let new_messages = chat.chat(&[ChatMessage::user("?")]).await.expect("chat");
        let tool_texts: Vec<&str> = new_messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .map(|m| m.text())
            .collect();
        assert_eq!(tool_texts.len(), 3);
        assert!(tool_texts[0].starts_with("Error: Invalid arguments for tool 'get_weather'"));
        assert_eq!(tool_texts[1], "Error: city is required");
        assert_eq!(tool_texts[2], "Error: Unknown tool: launch_rocket");
    }

    #[tokio::test]
    async fn loop_stops_after_max_rounds() {
        let provider = ScriptedProvider::new(vec![
            weather_call("c1", r#"{"city":"A"}"#),
            weather_call("c2", r#"{"city":"B"}"#),
            weather_call("c3", r#"{"city":"C"}"#),
        ]);
        let chat = McpToolChat::new(provider.clone(), Arc::new(WeatherTools), None)
            .with_max_rounds(2);

        let err = chat.chat(&[ChatMessage::user("loop")]).await.expect_err("limit");
        assert!(matches!(err, ChatError::ToolLoopLimit(2)));
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn app_notices_and_stale_system_messages_are_not_sent() {
        let provider = ScriptedProvider::new(vec![ChatMessage::assistant("ok")]);
        let chat = McpToolChat::new(provider.clone(), Arc::new(NoTools), Some("current".into()));
        let history = vec![
            ChatMessage::system("old prompt"),
            ChatMessage::app_info("Model set to qwen"),
            ChatMessage::user("hi"),
        ];

        chat.chat(&history).await.expect("chat");
        let sent = &provider.requests()[0];
        assert_eq!(
            sent,
            &vec![ChatMessage::system("current"), ChatMessage::user("hi")]
        );
    }

    fn engine_config() -> ChatConfig {
        ChatConfig {
            models: vec![(
                "local".to_string(),
                ModelConfig {
                    provider: ProviderKind::Ollama,
                    model: "qwen2.5".into(),
                    endpoint: None,
                    api_key_env: None,
                },
            )],
            servers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn engine_renders_prompt_and_uses_cached_provider() {
        let provider = ScriptedProvider::new(vec![ChatMessage::assistant("done")]);
        let factory = ProviderFactory::default();
        factory.insert("local", provider.clone());
        let engine = McpChatEngine::new(engine_config(), factory, Arc::new(WeatherTools));

        let turn = ChatTurn {
            session_id: "chat-1".into(),
            model: "local".into(),
            system_prompt: Some("Model {{ model }} with {{ tools | join(',') }}".into()),
            messages: vec![ChatMessage::user("hi")],
        };
        let new_messages = engine.chat(turn).await.expect("chat");
        assert_eq!(new_messages, vec![ChatMessage::assistant("done")]);
        assert_eq!(
            provider.requests()[0][0],
            ChatMessage::system("Model local with get_weather")
        );
    }

    #[tokio::test]
    async fn engine_rejects_unknown_models() {
        let engine = McpChatEngine::new(
            engine_config(),
            ProviderFactory::default(),
            Arc::new(NoTools),
        );
        let turn = ChatTurn {
            session_id: "chat-1".into(),
            model: "missing".into(),
            system_prompt: None,
            messages: vec![ChatMessage::user("hi")],
        };
        let err = engine.chat(turn).await.expect_err("unknown");
        assert!(matches!(err, ChatError::UnknownModel(name) if name == "missing"));
    }
}
