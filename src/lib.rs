//! casual-chat is a terminal chat client whose replies can call tools served
//! by MCP servers.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns sessions, configuration, prompt templates, providers and
//!   the tool-calling chat loop.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`commands`] implements slash-command parsing and command execution used
//!   by the chat loop.
//! - [`mcp`] spawns stdio MCP servers and exposes their tools.
//! - [`api`] defines the `chat/completions` payloads used by providers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches into
//! [`core::app`] and [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod mcp;
pub mod ui;
pub mod utils;
