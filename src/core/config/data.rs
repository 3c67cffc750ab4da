use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const OLLAMA_DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => OPENAI_DEFAULT_ENDPOINT,
            ProviderKind::Ollama => OLLAMA_DEFAULT_ENDPOINT,
        }
    }

    pub fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some(OPENAI_API_KEY_ENV),
            ProviderKind::Ollama => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    /// Model identifier sent to the provider.
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Environment variable holding the API key for this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ModelConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    pub fn api_key_env(&self) -> Option<&str> {
        self.api_key_env
            .as_deref()
            .or_else(|| self.provider.default_api_key_env())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
}

impl McpServerConfig {
    /// Only locally spawned stdio servers are supported.
    pub fn is_stdio(&self) -> bool {
        let transport_ok = self
            .transport
            .as_deref()
            .map(|transport| transport.eq_ignore_ascii_case("stdio"))
            .unwrap_or(true);
        transport_ok && self.url.is_none() && self.command.is_some()
    }
}

/// The JSON configuration listing models and MCP servers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatConfig {
    #[serde(default, deserialize_with = "ordered_models")]
    pub models: Vec<(String, ModelConfig)>,
    #[serde(default, deserialize_with = "ordered_servers")]
    pub servers: Vec<(String, McpServerConfig)>,
}

impl ChatConfig {
    pub fn model(&self, name: &str) -> Option<&ModelConfig> {
        self.models
            .iter()
            .find(|(model_name, _)| model_name == name)
            .map(|(_, config)| config)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.model(name).is_some()
    }

    /// Model names in file order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(name, _)| name.as_str())
    }

    /// The first configured model.
    pub fn default_model(&self) -> Option<&str> {
        self.model_names().next()
    }
}

fn ordered_models<'de, D>(deserializer: D) -> Result<Vec<(String, ModelConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(OrderedEntries::new("a map of model names to models"))
}

fn ordered_servers<'de, D>(deserializer: D) -> Result<Vec<(String, McpServerConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(OrderedEntries::new("a map of server names to servers"))
}

/// Collects a JSON object into a vector so entries keep their file order.
struct OrderedEntries<T> {
    expecting: &'static str,
    marker: std::marker::PhantomData<T>,
}

impl<T> OrderedEntries<T> {
    fn new(expecting: &'static str) -> Self {
        Self {
            expecting,
            marker: std::marker::PhantomData,
        }
    }
}

impl<'de, T> Visitor<'de> for OrderedEntries<T>
where
    T: Deserialize<'de>,
{
    type Value = Vec<(String, T)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, T)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            // Later duplicates win, like a JSON object would.
            entries.retain(|(existing, _)| existing != &key);
            entries.push((key, value));
        }
        Ok(entries)
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
