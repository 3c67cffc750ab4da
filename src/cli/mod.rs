//! Command-line interface parsing and handling
//!
//! This module parses arguments, loads the configuration and dispatches to
//! the chat UI or one of the listing commands.

pub mod template_list;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cli::template_list::list_templates;
use crate::core::app::App;
use crate::core::config::data::path_display;
use crate::core::config::ChatConfig;
use crate::core::constants::DEFAULT_TEMPLATES_DIR;
use crate::core::providers::ProviderFactory;
use crate::core::templates::TemplateStore;
use crate::core::tool_chat::McpChatEngine;
use crate::mcp::{McpToolHost, ToolHost};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_file_logging;

#[derive(Parser)]
#[command(name = "casual-chat")]
#[command(about = "A terminal chat interface for models that call MCP tools")]
#[command(
    long_about = "casual-chat is a full-screen terminal chat interface. Each chat keeps its own \
model, system prompt and history; replies can call tools served by MCP servers listed in the \
configuration file.\n\n\
Configuration:\n\
  casual_mcp_config.json in the working directory, or in the user config directory.\n\n\
Environment Variables (also read from a .env file in the working directory):\n\
  OPENAI_API_KEY    Key for OpenAI models (or the variable named by api_key_env)\n\
  CASUAL_CHAT_LOG   Log filter used with --log (default: info)\n\n\
Type /help inside the chat for commands and keys."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the JSON configuration file
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding system prompt templates
    #[arg(short = 't', long, global = true, value_name = "DIR", default_value = DEFAULT_TEMPLATES_DIR)]
    pub templates: PathBuf,

    /// Model to start with instead of the first configured one
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List configured models and MCP servers
    Models,
    /// List system prompt templates
    Templates,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    // A .env file in the working directory fills in unset variables such as API keys.
    let dotenv = dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Some(log) = &args.log {
        init_file_logging(log)?;
    }
    if let Some(path) = &dotenv {
        info!(path = %path_display(path), "Loaded environment file");
    }

    let templates = TemplateStore::new(&args.templates);
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Templates => {
            list_templates(&templates)?;
            Ok(())
        }
        Commands::Models => {
            let config = load_config(&args)?;
            config.print_models();
            Ok(())
        }
        Commands::Chat => {
            let config = load_config(&args)?;
            start_chat(config, templates, args.model.as_deref()).await
        }
    }
}

fn load_config(args: &Args) -> Result<ChatConfig, Box<dyn Error>> {
    let path = ChatConfig::resolve_path(args.config.as_deref());
    let config = ChatConfig::load_from_path(&path)?;
    info!(path = %path_display(&path), models = config.models.len(), "Loaded configuration");
    Ok(config)
}

async fn start_chat(
    config: ChatConfig,
    templates: TemplateStore,
    model: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    // Fail on a bad --model before spawning any servers.
    let mut app = App::new(config.clone(), templates, model)?;

    if !config.servers.is_empty() {
        eprintln!("Connecting to {} MCP server(s)...", config.servers.len());
    }
    let host = McpToolHost::connect(&config.servers).await;
    let servers: Vec<String> = host.server_names().map(str::to_string).collect();
    let tool_count = host.tool_specs().len();
    if !servers.is_empty() {
        app.add_notice(format!(
            "Connected to {} ({tool_count} tools)",
            servers.join(", ")
        ));
    }

    let tools: Arc<dyn ToolHost> = Arc::new(host);
    let engine = McpChatEngine::new(config, ProviderFactory::default(), tools);
    run_chat(app, Arc::new(engine)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_chat_with_template_dir() {
        let args = Args::try_parse_from(["casual-chat"]).expect("parse");
        assert!(args.command.is_none());
        assert_eq!(args.templates, PathBuf::from(DEFAULT_TEMPLATES_DIR));
        assert!(args.config.is_none());
        assert!(args.log.is_none());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let args = Args::try_parse_from([
            "casual-chat",
            "models",
            "--config",
            "custom.json",
            "-m",
            "local",
        ])
        .expect("parse");
        assert_eq!(args.command, Some(Commands::Models));
        assert_eq!(args.config, Some(PathBuf::from("custom.json")));
        assert_eq!(args.model.as_deref(), Some("local"));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Args::try_parse_from(["casual-chat", "deploy"]).is_err());
    }
}
