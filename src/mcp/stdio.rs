//! JSON-RPC client for MCP servers spawned as child processes.

use crate::core::config::McpServerConfig;
use rust_mcp_schema::schema_utils::{
    ClientMessage, FromMessage, MessageFromClient, NotificationFromClient, RequestFromClient,
    ServerMessage,
};
use rust_mcp_schema::{
    CallToolRequestParams, CallToolResult, ClientCapabilities, ContentBlock, Implementation,
    InitializeRequestParams, InitializeResult, ListToolsResult, PaginatedRequestParams, RequestId,
    RpcError, Tool, LATEST_PROTOCOL_VERSION,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

const MCP_METHOD_NOT_FOUND: i64 = -32601;
const MCP_MAX_TOOL_LIST: usize = 100;
const STDIO_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const STDIO_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

type PendingMap = Arc<Mutex<HashMap<RequestId, oneshot::Sender<ServerMessage>>>>;

pub struct StdioClient {
    server_name: String,
    stdin: Mutex<ChildStdin>,
    pending: PendingMap,
    next_request_id: AtomicI64,
    request_timeout: Duration,
}

impl StdioClient {
    /// Spawn the server process and start routing its stdout.
    pub async fn spawn(server_name: &str, config: &McpServerConfig) -> Result<Arc<Self>, String> {
        let command = config
            .command
            .as_deref()
            .ok_or_else(|| "MCP command is required for stdio transport.".to_string())?;
        debug!(server = %server_name, command = %command, args = ?config.args, "Starting MCP stdio server");

        let mut cmd = Command::new(command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| format!("Failed to start '{command}': {err}"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| "Unable to retrieve stdin.".to_string())?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| "Unable to retrieve stdout.".to_string())?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| "Unable to retrieve stderr.".to_string())?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let client = Arc::new(Self {
            server_name: server_name.to_string(),
            stdin: Mutex::new(stdin),
            pending: pending.clone(),
            next_request_id: AtomicI64::new(0),
            request_timeout: STDIO_REQUEST_TIMEOUT,
        });

        Self::spawn_stdout_reader(pending.clone(), stdout, client.server_name.clone());
        Self::spawn_stderr_drain(stderr, client.server_name.clone());

        tokio::spawn(async move {
            let _ = child.wait().await;
            // Dropping the senders wakes every waiter with a closed channel.
            pending.lock().await.clear();
        });

        Ok(client)
    }

    fn spawn_stdout_reader(
        pending: PendingMap,
        stdout: tokio::process::ChildStdout,
        server_name: String,
    ) {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                let value = match serde_json::from_str::<Value>(&line) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                let items = match value {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                for item in items {
                    if let Ok(message) = serde_json::from_value::<ServerMessage>(item) {
                        dispatch_message(&pending, message, &server_name).await;
                    }
                }
            }
            debug!(server = %server_name, "MCP stdio stdout closed");
        });
    }

    fn spawn_stderr_drain(stderr: tokio::process::ChildStderr, server_name: String) {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                debug!(server = %server_name, "stderr: {line}");
            }
        });
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Integer(self.next_request_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn write_message(&self, message: &ClientMessage) -> Result<(), String> {
        let mut payload = serde_json::to_string(message).map_err(|err| err.to_string())?;
        payload.push('\n');
        let mut stdin = self.stdin.lock().await;
        tokio::time::timeout(STDIO_WRITE_TIMEOUT, stdin.write_all(payload.as_bytes()))
            .await
            .map_err(|_| "Timed out writing MCP stdio message.".to_string())?
            .map_err(|err| err.to_string())?;
        tokio::time::timeout(STDIO_WRITE_TIMEOUT, stdin.flush())
            .await
            .map_err(|_| "Timed out flushing MCP stdio message.".to_string())?
            .map_err(|err| err.to_string())
    }

    pub async fn send_request(&self, request: RequestFromClient) -> Result<ServerMessage, String> {
        let request_id = self.next_request_id();
        debug!(server = %self.server_name, request_id = ?request_id, "Sending MCP stdio request");
        let message = ClientMessage::from_message(
            MessageFromClient::RequestFromClient(request),
            Some(request_id.clone()),
        )
        .map_err(|err| err.to_string())?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), tx);

        if let Err(err) = self.write_message(&message).await {
            self.pending.lock().await.remove(&request_id);
            return Err(err);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err("MCP server exited before responding.".to_string()),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                Err("MCP stdio request timed out.".to_string())
            }
        }
    }

    pub async fn send_notification(
        &self,
        notification: NotificationFromClient,
    ) -> Result<(), String> {
        let message = ClientMessage::from_message(
            MessageFromClient::NotificationFromClient(notification),
            None,
        )
        .map_err(|err| err.to_string())?;
        self.write_message(&message).await
    }

    pub async fn initialize(&self) -> Result<InitializeResult, String> {
        let response = self
            .send_request(RequestFromClient::InitializeRequest(client_details()))
            .await?;
        let result = parse_initialize_result(response)?;
        debug!(
            server = %self.server_name,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "MCP server initialized"
        );
        self.send_notification(NotificationFromClient::InitializedNotification(None))
            .await?;
        Ok(result)
    }

    /// List the server's tools, following pagination cursors.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, String> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.map(|cursor| PaginatedRequestParams {
                cursor: Some(cursor),
                meta: None,
            });
            let response = self
                .send_request(RequestFromClient::ListToolsRequest(params))
                .await?;
            if is_method_not_found(&response) {
                break;
            }
            let page: ListToolsResult = parse_response(response)?;
            tools.extend(page.tools);
            if tools.len() >= MCP_MAX_TOOL_LIST {
                tools.truncate(MCP_MAX_TOOL_LIST);
                break;
            }
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(tools)
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, String> {
        let mut params = CallToolRequestParams::new(name);
        if let Some(arguments) = arguments {
            params = params.with_arguments(arguments);
        }
        let response = self
            .send_request(RequestFromClient::CallToolRequest(params))
            .await?;
        parse_response(response)
    }
}

async fn dispatch_message(pending: &PendingMap, message: ServerMessage, server_name: &str) {
    match &message {
        ServerMessage::Response(response) => {
            debug!(server = %server_name, response_id = ?response.id, "Received MCP stdio response");
            if let Some(tx) = pending.lock().await.remove(&response.id) {
                let _ = tx.send(message);
            }
        }
        ServerMessage::Error(error) => {
            debug!(
                server = %server_name,
                error_id = ?error.id,
                error_code = error.error.code,
                "Received MCP stdio error"
            );
            if let Some(id) = error.id.as_ref() {
                if let Some(tx) = pending.lock().await.remove(id) {
                    let _ = tx.send(message);
                }
            }
        }
        ServerMessage::Request(request) => {
            debug!(server = %server_name, method = %request.method(), "Ignoring MCP server request");
        }
        ServerMessage::Notification(_) => {
            debug!(server = %server_name, "Received MCP stdio notification");
        }
    }
}

fn client_details() -> InitializeRequestParams {
    InitializeRequestParams {
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "casual-chat".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Casual Chat".to_string()),
            description: Some("Terminal chat client for MCP tool servers".to_string()),
            icons: Vec::new(),
            website_url: None,
        },
        meta: None,
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
    }
}

fn is_method_not_found(message: &ServerMessage) -> bool {
    matches!(
        message,
        ServerMessage::Error(error) if error.error.code == MCP_METHOD_NOT_FOUND
    )
}

fn parse_initialize_result(message: ServerMessage) -> Result<InitializeResult, String> {
    let result: InitializeResult = parse_response(message)?;
    if result.protocol_version.trim().is_empty() {
        return Err("Unexpected initialize response.".to_string());
    }
    Ok(result)
}

fn parse_response<T: serde::de::DeserializeOwned>(message: ServerMessage) -> Result<T, String> {
    let value = match message {
        ServerMessage::Response(response) => {
            serde_json::to_value(&response.result).map_err(|err| err.to_string())?
        }
        ServerMessage::Error(error) => return Err(format_rpc_error(&error.error)),
        other => return Err(format!("Unexpected MCP server message: {other:?}")),
    };
    serde_json::from_value::<T>(value).map_err(|err| err.to_string())
}

fn format_rpc_error(error: &RpcError) -> String {
    let mut output = format!("MCP error {}: {}", error.code, error.message);
    if let Some(data) = &error.data {
        let details = data
            .get("details")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .or_else(|| data.as_str().map(|value| value.to_string()))
            .or_else(|| serde_json::to_string_pretty(data).ok());

        if let Some(details) = details {
            if !details.is_empty() {
                output.push('\n');
                output.push_str(&details);
            }
        }
    }
    output
}

/// Flatten a tool result into the text handed back to the model. Results
/// flagged as errors come back as `Err` with the same text.
pub fn tool_result_text(result: &CallToolResult) -> Result<String, String> {
    let text = result
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::TextContent(text) => text.text.clone(),
            other => serde_json::to_string(other)
                .unwrap_or_else(|_| "Unsupported tool content.".to_string()),
        })
        .collect::<Vec<_>>()
        .join("\n");
    if result.is_error.unwrap_or(false) {
        Err(text)
    } else {
        Ok(text)
    }
}
