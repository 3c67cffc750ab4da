use super::data::{ChatConfig, ProviderKind, OLLAMA_DEFAULT_ENDPOINT, OPENAI_DEFAULT_ENDPOINT};
use super::io::ConfigError;
use std::fs;
use tempfile::TempDir;

const SAMPLE: &str = r#"{
    "models": {
        "zeta": { "provider": "openai", "model": "gpt-4.1-mini" },
        "alpha": { "provider": "ollama", "model": "qwen2.5:7b" },
        "local": {
            "provider": "openai",
            "model": "qwen",
            "endpoint": "http://localhost:1234/v1",
            "api_key_env": "LM_STUDIO_KEY"
        }
    },
    "servers": {
        "time": { "command": "uvx", "args": ["mcp-server-time"] },
        "remote": { "url": "https://example.com/mcp" }
    }
}"#;

#[test]
fn models_keep_file_order() {
    let config = ChatConfig::parse(SAMPLE).expect("parse");
    assert_eq!(
        config.model_names().collect::<Vec<_>>(),
        vec!["zeta", "alpha", "local"]
    );
    assert_eq!(config.default_model(), Some("zeta"));
}

#[test]
fn endpoints_and_keys_fall_back_to_provider_defaults() {
    let config = ChatConfig::parse(SAMPLE).expect("parse");

    let zeta = config.model("zeta").expect("zeta");
    assert_eq!(zeta.provider, ProviderKind::OpenAi);
    assert_eq!(zeta.endpoint(), OPENAI_DEFAULT_ENDPOINT);
    assert_eq!(zeta.api_key_env(), Some("OPENAI_API_KEY"));

    let alpha = config.model("alpha").expect("alpha");
    assert_eq!(alpha.endpoint(), OLLAMA_DEFAULT_ENDPOINT);
    assert_eq!(alpha.api_key_env(), None);

    let local = config.model("local").expect("local");
    assert_eq!(local.endpoint(), "http://localhost:1234/v1");
    assert_eq!(local.api_key_env(), Some("LM_STUDIO_KEY"));
}

#[test]
fn only_stdio_servers_are_usable() {
    let config = ChatConfig::parse(SAMPLE).expect("parse");
    let stdio: Vec<&str> = config
        .servers
        .iter()
        .filter(|(_, server)| server.is_stdio())
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(stdio, vec!["time"]);
}

#[test]
fn duplicate_model_keys_keep_last_value() {
    let config = ChatConfig::parse(
        r#"{"models": {
            "a": {"provider": "openai", "model": "one"},
            "b": {"provider": "openai", "model": "two"},
            "a": {"provider": "openai", "model": "three"}
        }}"#,
    )
    .expect("parse");
    assert_eq!(config.model_names().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(config.model("a").map(|m| m.model.as_str()), Some("three"));
}

#[test]
fn unknown_provider_is_a_parse_error() {
    let err = ChatConfig::parse(r#"{"models": {"a": {"provider": "mystery", "model": "x"}}}"#)
        .expect_err("should fail");
    assert!(err.to_string().contains("mystery"));
}

#[test]
fn load_reports_missing_file_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("missing.json");
    let err = ChatConfig::load_from_path(&path).expect_err("missing file");
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn load_rejects_config_without_models() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("empty.json");
    fs::write(&path, r#"{"servers": {}}"#).expect("write");
    let err = ChatConfig::load_from_path(&path).expect_err("no models");
    assert!(matches!(err, ConfigError::NoModels { .. }));
}

#[test]
fn load_reads_valid_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("casual_mcp_config.json");
    fs::write(&path, SAMPLE).expect("write");
    let config = ChatConfig::load_from_path(&path).expect("load");
    assert_eq!(config.models.len(), 3);
    assert_eq!(config.servers.len(), 2);
}

#[test]
fn explicit_path_wins_resolution() {
    let explicit = std::path::Path::new("/tmp/custom.json");
    assert_eq!(ChatConfig::resolve_path(Some(explicit)), explicit);
}
