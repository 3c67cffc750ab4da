use super::*;
use crate::core::app::UiMode;
use crate::core::config::{ChatConfig, ModelConfig, ProviderKind};
use crate::core::message::Role;
use crate::core::templates::TemplateStore;
use tempfile::TempDir;

fn app() -> (TempDir, App) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = ChatConfig {
        models: ["qwen", "llama"]
            .into_iter()
            .map(|name| {
                (
                    name.to_string(),
                    ModelConfig {
                        provider: ProviderKind::Ollama,
                        model: name.to_string(),
                        endpoint: None,
                        api_key_env: None,
                    },
                )
            })
            .collect(),
        servers: Vec::new(),
    };
    let templates = TemplateStore::new(temp_dir.path().join("templates"));
    let app = App::new(config, templates, None).expect("app");
    (temp_dir, app)
}

#[test]
fn plain_text_and_unknown_commands_are_messages() {
    let (_dir, mut app) = app();
    assert_eq!(
        process_input(&mut app, "hello there"),
        CommandResult::ProcessAsMessage("hello there".into())
    );
    assert_eq!(
        process_input(&mut app, "/etc/hosts is a file"),
        CommandResult::ProcessAsMessage("/etc/hosts is a file".into())
    );
    assert_eq!(
        process_input(&mut app, "/"),
        CommandResult::ProcessAsMessage("/".into())
    );
}

#[test]
fn help_lists_every_command() {
    let (_dir, mut app) = app();
    assert_eq!(process_input(&mut app, "/help"), CommandResult::Continue);
    let notice = app
        .active_session()
        .and_then(|s| s.messages.last())
        .expect("help notice");
    assert_eq!(notice.role, Role::AppInfo);
    for command in all_commands() {
        assert!(notice.text().contains(command.usage), "{}", command.name);
    }
}

#[test]
fn session_commands_create_switch_and_delete() {
    let (_dir, mut app) = app();
    process_input(&mut app, "/new");
    assert_eq!(app.active_id(), "chat-2");

    process_input(&mut app, "/switch chat-1");
    assert_eq!(app.active_id(), "chat-1");

    process_input(&mut app, "/switch chat-9");
    assert_eq!(app.ui.status.as_deref(), Some("Session 'chat-9' not found"));

    process_input(&mut app, "/delete chat-2");
    assert_eq!(app.sessions.ids().collect::<Vec<_>>(), vec!["chat-1"]);

    process_input(&mut app, "/delete");
    assert_eq!(app.sessions.ids().collect::<Vec<_>>(), vec!["chat-3"]);
}

#[test]
fn model_command_switches_or_opens_picker() {
    let (_dir, mut app) = app();
    process_input(&mut app, "/MODEL llama");
    assert_eq!(app.active_model(), Some("llama"));

    process_input(&mut app, "/model");
    assert!(matches!(app.ui.mode, UiMode::Picker { .. }));
}

#[test]
fn save_and_template_commands_round_trip() {
    let (_dir, mut app) = app();
    process_input(&mut app, "/prompt Answer in French.");
    process_input(&mut app, "/save french");
    process_input(&mut app, "/new");
    process_input(&mut app, "/prompt Answer in English.");
    process_input(&mut app, "/template french");
    assert_eq!(app.active_system_prompt(), "Answer in French.");

    process_input(&mut app, "/save");
    assert_eq!(app.ui.status.as_deref(), Some("Usage: /save <name>"));
}

#[test]
fn prompt_without_text_opens_editor() {
    let (_dir, mut app) = app();
    process_input(&mut app, "/prompt");
    assert!(matches!(app.ui.mode, UiMode::PromptEditor(_)));
}

#[test]
fn tools_command_toggles_and_sets() {
    let (_dir, mut app) = app();
    process_input(&mut app, "/tools");
    assert!(app.show_tool_calls);
    process_input(&mut app, "/tools off");
    assert!(!app.show_tool_calls);
    process_input(&mut app, "/tools maybe");
    assert_eq!(app.ui.status.as_deref(), Some("Usage: /tools [on|off]"));
}

#[test]
fn matching_commands_filters_by_prefix() {
    let names: Vec<&str> = matching_commands("/s")
        .into_iter()
        .map(|command| command.name)
        .collect();
    assert_eq!(names, vec!["switch", "sessions", "save"]);
}
