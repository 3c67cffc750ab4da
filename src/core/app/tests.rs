use super::*;
use crate::core::config::{ModelConfig, ProviderKind};
use crate::core::message::Role;
use crate::ui::picker::PickerState;
use tempfile::TempDir;

fn config() -> ChatConfig {
    let model = |name: &str| ModelConfig {
        provider: ProviderKind::Ollama,
        model: name.to_string(),
        endpoint: None,
        api_key_env: None,
    };
    ChatConfig {
        models: vec![
            ("qwen".to_string(), model("qwen2.5")),
            ("llama".to_string(), model("llama3.2")),
        ],
        servers: Vec::new(),
    }
}

fn app() -> (TempDir, App) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let templates = TemplateStore::new(temp_dir.path().join("prompt-templates"));
    let app = App::new(config(), templates, None).expect("app");
    (temp_dir, app)
}

#[test]
fn starts_with_default_model_and_prompt() {
    let (_dir, app) = app();
    assert_eq!(app.active_id(), "chat-1");
    assert_eq!(app.active_model(), Some("qwen"));
    assert_eq!(app.active_system_prompt(), DEFAULT_SYSTEM_PROMPT);
}

#[test]
fn initial_model_must_be_configured() {
    let err = App::new(config(), TemplateStore::default(), Some("gpt-9"))
        .err()
        .expect("unknown model");
    assert!(matches!(err, AppError::UnknownModel(name) if name == "gpt-9"));

    let app = App::new(config(), TemplateStore::default(), Some("llama")).expect("app");
    assert_eq!(app.active_model(), Some("llama"));
}

#[test]
fn new_session_inherits_settings_but_not_messages() {
    let (_dir, mut app) = app();
    app.set_model("llama").expect("model");
    app.set_system_prompt("Talk like a pirate");
    app.add_notice("hello");

    let id = app.new_session();
    assert_eq!(id, "chat-2");
    assert_eq!(app.active_id(), "chat-2");
    let session = app.active_session().expect("session");
    assert_eq!(session.model.as_deref(), Some("llama"));
    assert_eq!(session.system_prompt.as_deref(), Some("Talk like a pirate"));
    assert!(session.messages.is_empty());
}

#[test]
fn deleting_last_session_starts_fresh_one() {
    let (_dir, mut app) = app();
    app.set_system_prompt("custom");
    app.delete_active_session().expect("delete");

    assert_eq!(app.sessions.len(), 1);
    assert_eq!(app.active_id(), "chat-2");
    assert_eq!(app.active_system_prompt(), DEFAULT_SYSTEM_PROMPT);
}

#[test]
fn deleting_active_session_moves_to_first_remaining() {
    let (_dir, mut app) = app();
    app.new_session();
    app.new_session();
    app.delete_session("chat-3").expect("delete");
    assert_eq!(app.active_id(), "chat-1");
    assert!(app.delete_session("chat-3").is_err());
}

#[test]
fn cycling_sessions_wraps() {
    let (_dir, mut app) = app();
    app.new_session();
    app.new_session();
    app.cycle_session(1);
    assert_eq!(app.active_id(), "chat-1");
    app.cycle_session(-1);
    assert_eq!(app.active_id(), "chat-3");
}

#[test]
fn set_model_rejects_unknown_names() {
    let (_dir, mut app) = app();
    assert!(matches!(
        app.set_model("mystery"),
        Err(AppError::UnknownModel(_))
    ));
    assert_eq!(app.active_model(), Some("qwen"));
}

#[test]
fn templates_save_and_apply() {
    let (_dir, mut app) = app();
    app.set_system_prompt("Be concise.");
    let path = app.save_template("concise").expect("save");
    assert!(path.exists());
    assert_eq!(
        app.active_session().and_then(|s| s.template.as_deref()),
        Some("concise")
    );

    app.new_session();
    app.set_system_prompt("something else");
    app.apply_template("concise").expect("apply");
    assert_eq!(app.active_system_prompt(), "Be concise.");

    assert!(matches!(
        app.apply_template("missing"),
        Err(AppError::Template(TemplateError::NotFound { .. }))
    ));
}

#[test]
fn submit_builds_turn_without_notices() {
    let (_dir, mut app) = app();
    app.add_notice("Model set");
    let turn = app.submit_message("What time is it?").expect("turn");

    assert_eq!(turn.session_id, "chat-1");
    assert_eq!(turn.model, "qwen");
    assert_eq!(turn.system_prompt.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
    assert_eq!(turn.messages, vec![ChatMessage::user("What time is it?")]);
    assert!(app.is_busy());

    assert!(matches!(app.submit_message("again"), Err(AppError::Busy)));
    assert!(matches!(app.submit_message("  "), Err(AppError::EmptyMessage)));
}

#[test]
fn finish_chat_appends_reply_to_origin_session() {
    let (_dir, mut app) = app();
    let turn = app.submit_message("hi").expect("turn");
    app.new_session();

    let applied = app.finish_chat(&turn.session_id, Ok(vec![ChatMessage::assistant("hello")]));
    assert!(applied);
    assert!(!app.is_busy());
    let origin = app.sessions.get("chat-1").expect("origin");
    assert_eq!(origin.messages.len(), 2);
    assert!(app.active_session().expect("active").messages.is_empty());
}

#[test]
fn finish_chat_records_errors_as_notices() {
    let (_dir, mut app) = app();
    let turn = app.submit_message("hi").expect("turn");
    app.finish_chat(&turn.session_id, Err(ChatError::EmptyResponse));

    let last = app
        .active_session()
        .and_then(|s| s.messages.last())
        .expect("error notice");
    assert_eq!(last.role, Role::AppError);
    assert_eq!(last.text(), "Provider returned no choices");
    assert!(app.ui.status.as_deref().unwrap_or_default().starts_with("Error"));
}

#[test]
fn late_reply_for_deleted_session_is_discarded() {
    let (_dir, mut app) = app();
    let turn = app.submit_message("hi").expect("turn");
    app.delete_session(&turn.session_id).expect("delete");
    assert!(app.is_busy());
    assert!(app
        .ui
        .status
        .as_deref()
        .unwrap_or_default()
        .contains("will be discarded"));

    let applied = app.finish_chat(&turn.session_id, Ok(vec![ChatMessage::assistant("late")]));
    assert!(!applied);
    assert!(!app.is_busy());
    assert!(app.active_session().expect("active").messages.is_empty());
}

#[test]
fn new_turn_waits_for_orphaned_reply() {
    let (_dir, mut app) = app();
    let turn = app.submit_message("hi").expect("turn");
    app.delete_session(&turn.session_id).expect("delete");

    assert!(matches!(app.submit_message("again"), Err(AppError::Busy)));
    assert!(app.active_session().expect("active").messages.is_empty());

    app.finish_chat(&turn.session_id, Err(ChatError::EmptyResponse));
    let next = app.submit_message("again").expect("accepted after the late reply");
    assert_ne!(next.session_id, turn.session_id);
}

#[test]
fn model_picker_applies_selection() {
    let (_dir, mut app) = app();
    app.open_picker(PickerKind::Model);
    let state: &mut PickerState = app.picker_state_mut().expect("picker");
    assert_eq!(state.selected_id(), Some("qwen"));
    state.move_down();

    app.confirm_picker().expect("confirm");
    assert!(app.ui.is_typing());
    assert_eq!(app.active_model(), Some("llama"));
}

#[test]
fn template_picker_without_templates_stays_in_typing_mode() {
    let (_dir, mut app) = app();
    app.open_picker(PickerKind::Template);
    assert!(app.ui.is_typing());
    assert!(app.ui.status.as_deref().unwrap_or_default().contains("No templates"));
}

#[test]
fn prompt_editor_apply_and_save_flow() {
    let (_dir, mut app) = app();
    app.open_prompt_editor();
    let editor = app.prompt_editor_mut().expect("editor");
    editor.select_all();
    editor.cut();
    editor.insert_str("You are a weather bot.");

    app.begin_template_save();
    assert_eq!(app.active_system_prompt(), "You are a weather bot.");
    app.prompt_editor_mut().expect("name input").insert_str("weather");
    app.confirm_template_name().expect("save");

    assert!(app.ui.is_typing());
    assert_eq!(app.templates.list().expect("list"), vec!["weather".to_string()]);
}

#[test]
fn invalid_template_name_keeps_name_prompt_open() {
    let (_dir, mut app) = app();
    app.begin_template_save();
    app.prompt_editor_mut().expect("name input").insert_str("../bad");
    assert!(app.confirm_template_name().is_err());
    assert!(matches!(app.ui.mode, UiMode::TemplateName(_)));
}
