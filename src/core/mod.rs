pub mod app;
pub mod config;
pub mod constants;
pub mod message;
pub mod providers;
pub mod session;
pub mod templates;
pub mod tool_chat;
