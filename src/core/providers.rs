//! Model providers speaking the OpenAI-compatible `chat/completions` API.

use crate::api::{format_api_error, to_api_messages, ChatRequest, ChatResponse, ChatToolDefinition};
use crate::core::config::ModelConfig;
use crate::core::message::ChatMessage;
use crate::mcp::ToolSpec;
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug)]
pub enum ChatError {
    UnknownModel(String),
    MissingApiKey { model: String, env_var: String },
    Http(reqwest::Error),
    Api { status: u16, message: String },
    Decode(String),
    EmptyResponse,
    ToolLoopLimit(usize),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::UnknownModel(name) => write!(f, "Model '{name}' is not configured"),
            ChatError::MissingApiKey { model, env_var } => write!(
                f,
                "Model '{model}' needs an API key; set the {env_var} environment variable"
            ),
            ChatError::Http(err) => write!(f, "Request failed: {err}"),
            ChatError::Api { status, message } => write!(f, "HTTP {status}\n{message}"),
            ChatError::Decode(detail) => write!(f, "Could not decode provider response: {detail}"),
            ChatError::EmptyResponse => write!(f, "Provider returned no choices"),
            ChatError::ToolLoopLimit(rounds) => write!(
                f,
                "Stopped after {rounds} model calls without a final answer"
            ),
        }
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChatError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Http(err)
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the conversation and return the assistant's reply, which may
    /// request tool calls.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, ChatError>;
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        }
    }

    /// Build a provider from a model entry, reading its API key from the
    /// environment.
    pub fn from_config(
        client: reqwest::Client,
        name: &str,
        config: &ModelConfig,
    ) -> Result<Self, ChatError> {
        let api_key = match config.api_key_env() {
            Some(env_var) => match std::env::var(env_var) {
                Ok(key) if !key.trim().is_empty() => Some(key),
                _ => {
                    return Err(ChatError::MissingApiKey {
                        model: name.to_string(),
                        env_var: env_var.to_string(),
                    })
                }
            },
            None => None,
        };
        Ok(Self::new(client, config.endpoint(), api_key, &config.model))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatMessage, ChatError> {
        let tools = (!tools.is_empty()).then(|| {
            tools
                .iter()
                .map(|tool| {
                    ChatToolDefinition::function(
                        &tool.name,
                        tool.description.clone(),
                        tool.input_schema.clone(),
                    )
                })
                .collect::<Vec<_>>()
        });
        let request = ChatRequest {
            model: self.model.clone(),
            messages: to_api_messages(messages),
            stream: false,
            tools,
        };

        let chat_url = chat_completions_url(&self.base_url);
        debug!(url = %chat_url, model = %self.model, messages = request.messages.len(), "Sending chat request");

        let mut http_request = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {key}"));
        }

        let response = http_request.json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ChatError::Api {
                status: status.as_u16(),
                message: format_api_error(&body),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|err| ChatError::Decode(err.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyResponse)?;
        debug!(finish_reason = ?choice.finish_reason, "Received chat response");
        Ok(choice.message.into_message())
    }
}

/// Hands out one provider per configured model name, reusing it across turns.
pub struct ProviderFactory {
    client: reqwest::Client,
    providers: Mutex<HashMap<String, Arc<dyn Provider>>>,
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl ProviderFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a ready-made provider under a model name.
    pub fn insert(&self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        if let Ok(mut providers) = self.providers.lock() {
            providers.insert(name.into(), provider);
        }
    }

    pub fn get_provider(
        &self,
        name: &str,
        config: &ModelConfig,
    ) -> Result<Arc<dyn Provider>, ChatError> {
        let mut providers = self
            .providers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(provider) = providers.get(name) {
            return Ok(Arc::clone(provider));
        }
        let provider: Arc<dyn Provider> =
            Arc::new(OpenAiProvider::from_config(self.client.clone(), name, config)?);
        debug!(model = name, provider = config.provider.as_str(), "Created provider");
        providers.insert(name.to_string(), Arc::clone(&provider));
        Ok(provider)
    }
}

/// `<base>/chat/completions`, tolerating trailing slashes on the base.
fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
