//! Tool hosting over the Model Context Protocol.

pub mod host;
pub mod stdio;

pub use host::{McpToolHost, NoTools, ToolHost, ToolSpec};
