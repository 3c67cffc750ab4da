use super::stdio::{tool_result_text, StdioClient};
use crate::core::config::McpServerConfig;
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const MCP_STARTUP_CONCURRENCY_LIMIT: usize = 3;

/// A tool as offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema of the argument object.
    pub input_schema: Value,
}

#[async_trait]
pub trait ToolHost: Send + Sync {
    fn tool_specs(&self) -> Vec<ToolSpec>;

    /// Run a tool and return the text handed back to the model.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<String, String>;
}

/// A host without tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTools;

#[async_trait]
impl ToolHost for NoTools {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        Vec::new()
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: Option<Map<String, Value>>,
    ) -> Result<String, String> {
        Err(format!("Unknown tool: {name}"))
    }
}

struct ConnectedServer {
    name: String,
    client: Arc<StdioClient>,
}

/// Tools gathered from every reachable stdio MCP server.
#[derive(Default)]
pub struct McpToolHost {
    servers: Vec<ConnectedServer>,
    tools: Vec<ToolSpec>,
    /// Tool name to index into `servers`.
    routes: HashMap<String, usize>,
}

impl McpToolHost {
    /// Connect to the configured servers. Servers that cannot be started or
    /// initialized are skipped.
    pub async fn connect(servers: &[(String, McpServerConfig)]) -> Self {
        let usable: Vec<(String, McpServerConfig)> = servers
            .iter()
            .filter(|(name, config)| {
                if config.is_stdio() {
                    true
                } else {
                    warn!(server = %name, "Skipping MCP server: only stdio servers with a command are supported");
                    false
                }
            })
            .cloned()
            .collect();

        let connected: Vec<(String, Arc<StdioClient>, Vec<rust_mcp_schema::Tool>)> =
            stream::iter(usable)
                .map(|(name, config)| async move {
                    match connect_server(&name, &config).await {
                        Ok((client, tools)) => Some((name, client, tools)),
                        Err(err) => {
                            warn!(server = %name, error = %err, "Failed to connect MCP server");
                            None
                        }
                    }
                })
                .buffered(MCP_STARTUP_CONCURRENCY_LIMIT)
                .filter_map(|result| async move { result })
                .collect()
                .await;

        let mut host = McpToolHost::default();
        for (name, client, tools) in connected {
            info!(server = %name, tools = tools.len(), "Connected MCP server");
            let index = host.servers.len();
            host.servers.push(ConnectedServer { name, client });
            for tool in tools {
                let spec = ToolSpec {
                    input_schema: serde_json::to_value(&tool.input_schema)
                        .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
                    description: tool.description,
                    name: tool.name,
                };
                host.add_tool(index, spec);
            }
        }
        host
    }

    fn add_tool(&mut self, server_index: usize, spec: ToolSpec) {
        if let Some(existing) = self.routes.get(&spec.name) {
            warn!(
                tool = %spec.name,
                kept = %self.servers[*existing].name,
                skipped = %self.servers[server_index].name,
                "Duplicate MCP tool name; keeping the first"
            );
            return;
        }
        self.routes.insert(spec.name.clone(), server_index);
        self.tools.push(spec);
    }

    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|server| server.name.as_str())
    }
}

async fn connect_server(
    name: &str,
    config: &McpServerConfig,
) -> Result<(Arc<StdioClient>, Vec<rust_mcp_schema::Tool>), String> {
    let client = StdioClient::spawn(name, config).await?;
    client.initialize().await?;
    let tools = client.list_tools().await?;
    Ok((client, tools))
}

#[async_trait]
impl ToolHost for McpToolHost {
    fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools.clone()
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<String, String> {
        let server = self
            .routes
            .get(name)
            .and_then(|index| self.servers.get(*index))
            .ok_or_else(|| format!("Unknown tool: {name}"))?;
        let result = server.client.call_tool(name, arguments).await?;
        tool_result_text(&result)
    }
}
