pub mod data;
pub mod io;
pub mod printing;

pub use data::{ChatConfig, McpServerConfig, ModelConfig, ProviderKind};
pub use io::ConfigError;

#[cfg(test)]
mod tests;
