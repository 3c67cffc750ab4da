//! Input handling for the chat loop.
//!
//! Keys are resolved through [`keybindings::resolve`] and applied to the
//! [`App`]. Sending a message yields a [`ChatTurn`] for the loop to run in the
//! background; its result comes back as a [`ChatOutcome`].

use super::keybindings::{resolve, KeyAction, KeyContext};
use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, UiMode};
use crate::core::message::ChatMessage;
use crate::core::providers::ChatError;
use crate::core::tool_chat::{ChatEngine, ChatTurn};
use ratatui::crossterm::event::{self, Event, KeyEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tui_textarea::{Input as TAInput, Key as TAKey};

pub enum UiEvent {
    Crossterm(Event),
}

/// A finished turn, addressed to the session that started it.
#[derive(Debug)]
pub struct ChatOutcome {
    pub session_id: String,
    pub result: Result<Vec<ChatMessage>, ChatError>,
}

#[derive(Debug)]
pub enum KeyOutcome {
    Continue,
    Quit,
    Send(ChatTurn),
}

pub(crate) fn spawn_event_reader(
    event_tx: mpsc::UnboundedSender<UiEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub(crate) fn spawn_chat_turn(
    engine: Arc<dyn ChatEngine>,
    turn: ChatTurn,
    outcome_tx: mpsc::UnboundedSender<ChatOutcome>,
) {
    tokio::spawn(async move {
        let session_id = turn.session_id.clone();
        debug!(session = %session_id, model = %turn.model, "Starting chat turn");
        let result = engine.chat(turn).await;
        if let Err(err) = &result {
            warn!(session = %session_id, error = %err, "Chat turn failed");
        }
        let _ = outcome_tx.send(ChatOutcome { session_id, result });
    });
}

pub(crate) fn apply_chat_outcome(app: &mut App, outcome: ChatOutcome) {
    if !app.finish_chat(&outcome.session_id, outcome.result) {
        debug!(session = %outcome.session_id, "Reply arrived after its chat was deleted");
    }
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    let without_crlf = text.replace("\r\n", "\n");
    let without_cr = without_crlf.replace('\r', "\n");
    let expanded_tabs = without_cr.replace('\t', "    ");
    expanded_tabs
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

pub(crate) fn handle_paste(app: &mut App, text: &str) {
    let sanitized = sanitize_pasted_text(text);
    if sanitized.is_empty() {
        return;
    }
    match &mut app.ui.mode {
        UiMode::Typing => {
            app.ui.input_mut().insert_str(&sanitized);
        }
        UiMode::PromptEditor(editor) => {
            editor.insert_str(&sanitized);
        }
        UiMode::TemplateName(input) => {
            input.insert_str(sanitized.replace('\n', " "));
        }
        UiMode::Picker { .. } => {}
    }
}

/// Apply one key press. `page` is how far PageUp/PageDown scroll.
pub fn handle_key(app: &mut App, key: KeyEvent, page: u16) -> KeyOutcome {
    let action = resolve(KeyContext::from(&app.ui.mode), &key);
    match action {
        KeyAction::Quit => return KeyOutcome::Quit,
        KeyAction::Submit => {
            if let Some(turn) = submit_input(app) {
                return KeyOutcome::Send(turn);
            }
        }
        KeyAction::InsertNewline => {
            app.ui.input_mut().insert_newline();
        }
        KeyAction::NewSession => {
            app.new_session();
        }
        KeyAction::DeleteSession => {
            if let Err(err) = app.delete_active_session() {
                app.ui.set_status(err.to_string());
            }
        }
        KeyAction::CycleSession(offset) => app.cycle_session(offset),
        KeyAction::OpenPicker(kind) => app.open_picker(kind),
        KeyAction::EditPrompt => app.open_prompt_editor(),
        KeyAction::ToggleToolCalls => app.toggle_tool_calls(),
        KeyAction::ScrollUp => app.ui.scroll_up(page),
        KeyAction::ScrollDown => app.ui.scroll_down(page),
        KeyAction::ScrollToBottom => app.ui.scroll_to_bottom(),
        KeyAction::ClearStatus => app.ui.clear_status(),
        KeyAction::PickerUp => {
            if let Some(picker) = app.picker_state_mut() {
                picker.move_up();
            }
        }
        KeyAction::PickerDown => {
            if let Some(picker) = app.picker_state_mut() {
                picker.move_down();
            }
        }
        KeyAction::PickerStart => {
            if let Some(picker) = app.picker_state_mut() {
                picker.move_to_start();
            }
        }
        KeyAction::PickerEnd => {
            if let Some(picker) = app.picker_state_mut() {
                picker.move_to_end();
            }
        }
        KeyAction::Confirm => {
            let result = if matches!(app.ui.mode, UiMode::TemplateName(_)) {
                app.confirm_template_name()
            } else {
                app.confirm_picker()
            };
            if let Err(err) = result {
                app.ui.set_status(err.to_string());
            }
        }
        KeyAction::Cancel => app.cancel_mode(),
        KeyAction::ApplyPrompt => app.apply_prompt_editor(),
        KeyAction::SaveTemplate => app.begin_template_save(),
        KeyAction::Edit => edit_focused_text(app, key),
        KeyAction::Ignore => {}
    }
    KeyOutcome::Continue
}

fn edit_focused_text(app: &mut App, key: KeyEvent) {
    let input = TAInput::from(key);
    // Single-line name entry.
    if matches!(app.ui.mode, UiMode::TemplateName(_)) && input.key == TAKey::Enter {
        return;
    }
    if let Some(editor) = app.prompt_editor_mut() {
        editor.input(input);
    } else if app.ui.is_typing() {
        app.ui.input_mut().input(input);
    }
}

/// Run the input as a command, or send it as a message. The input is kept
/// when the message cannot be sent.
fn submit_input(app: &mut App) -> Option<ChatTurn> {
    let text = app.ui.input_text();
    if text.trim().is_empty() {
        return None;
    }
    match process_input(app, &text) {
        CommandResult::Continue => {
            app.ui.take_input();
            None
        }
        CommandResult::ProcessAsMessage(message) => match app.submit_message(&message) {
            Ok(turn) => {
                app.ui.take_input();
                Some(turn)
            }
            Err(err) => {
                app.ui.set_status(err.to_string());
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::PickerKind;
    use crate::core::config::ChatConfig;
    use crate::core::message::Role;
    use crate::core::templates::TemplateStore;
    use async_trait::async_trait;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use tempfile::TempDir;

    fn app() -> (TempDir, App) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = ChatConfig::parse(
            r#"{"models": {
                "gpt": {"provider": "openai", "model": "gpt-4.1-mini"},
                "local": {"provider": "ollama", "model": "qwen2.5"}
            }}"#,
        )
        .expect("config");
        let templates = TemplateStore::new(temp_dir.path().join("prompt-templates"));
        let app = App::new(config, templates, None).expect("app");
        (temp_dir, app)
    }

    fn press(app: &mut App, code: KeyCode) -> KeyOutcome {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE), 10)
    }

    fn ctrl(app: &mut App, c: char) -> KeyOutcome {
        handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL), 10)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    struct EchoEngine;

    #[async_trait]
    impl ChatEngine for EchoEngine {
        async fn chat(&self, turn: ChatTurn) -> Result<Vec<ChatMessage>, ChatError> {
            let last = turn.messages.last().map(|m| m.text().to_string()).unwrap_or_default();
            Ok(vec![ChatMessage::assistant(format!("echo: {last}"))])
        }
    }

    #[test]
    fn sanitize_paste_text_removes_control_characters() {
        assert_eq!(
            sanitize_pasted_text("a\r\nb\rc\td\u{7}"),
            "a\nb\nc    d"
        );
    }

    #[test]
    fn paste_inserts_into_input() {
        let (_dir, mut app) = app();
        handle_paste(&mut app, "line one\r\nline two");
        assert_eq!(app.ui.input_text(), "line one\nline two");
    }

    #[test]
    fn enter_sends_typed_message() {
        let (_dir, mut app) = app();
        type_text(&mut app, "hello");
        let KeyOutcome::Send(turn) = press(&mut app, KeyCode::Enter) else {
            panic!("expected a turn");
        };
        assert_eq!(turn.model, "gpt");
        assert_eq!(turn.messages.last().map(|m| m.text()), Some("hello"));
        assert_eq!(app.ui.input_text(), "");
        assert!(app.is_busy());
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let (_dir, mut app) = app();
        type_text(&mut app, "   ");
        assert!(matches!(press(&mut app, KeyCode::Enter), KeyOutcome::Continue));
        assert!(!app.is_busy());
    }

    #[test]
    fn busy_chat_keeps_input() {
        let (_dir, mut app) = app();
        type_text(&mut app, "first");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "second");
        assert!(matches!(press(&mut app, KeyCode::Enter), KeyOutcome::Continue));
        assert_eq!(app.ui.input_text(), "second");
        assert!(app.ui.status.is_some());
    }

    #[test]
    fn slash_commands_are_not_sent() {
        let (_dir, mut app) = app();
        type_text(&mut app, "/model local");
        assert!(matches!(press(&mut app, KeyCode::Enter), KeyOutcome::Continue));
        assert_eq!(app.active_model(), Some("local"));
        assert_eq!(app.ui.input_text(), "");
    }

    #[test]
    fn model_picker_via_keys() {
        let (_dir, mut app) = app();
        ctrl(&mut app, 'p');
        assert!(matches!(
            app.ui.mode,
            UiMode::Picker {
                kind: PickerKind::Model,
                ..
            }
        ));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert!(app.ui.is_typing());
        assert_eq!(app.active_model(), Some("local"));
    }

    #[test]
    fn prompt_editor_save_flow() {
        let (_dir, mut app) = app();
        ctrl(&mut app, 'e');
        let editor = app.prompt_editor_mut().expect("editor");
        editor.select_all();
        editor.cut();
        type_text(&mut app, "Be terse.");
        ctrl(&mut app, 's');
        assert_eq!(app.active_system_prompt(), "Be terse.");
        type_text(&mut app, "terse");
        press(&mut app, KeyCode::Enter);
        assert!(app.ui.is_typing());
        assert_eq!(app.templates.load("terse").expect("saved"), "Be terse.");
    }

    #[test]
    fn ctrl_n_and_alt_arrows_switch_chats() {
        let (_dir, mut app) = app();
        ctrl(&mut app, 'n');
        assert_eq!(app.active_id(), "chat-2");
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Up, KeyModifiers::ALT),
            10,
        );
        assert_eq!(app.active_id(), "chat-1");
    }

    #[test]
    fn ctrl_c_quits() {
        let (_dir, mut app) = app();
        assert!(matches!(ctrl(&mut app, 'c'), KeyOutcome::Quit));
    }

    #[tokio::test]
    async fn spawned_turn_reports_back_to_its_session() {
        let (_dir, mut app) = app();
        type_text(&mut app, "ping");
        let KeyOutcome::Send(turn) = press(&mut app, KeyCode::Enter) else {
            panic!("expected a turn");
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_chat_turn(Arc::new(EchoEngine), turn, tx);
        let outcome = rx.recv().await.expect("outcome");
        apply_chat_outcome(&mut app, outcome);

        assert!(!app.is_busy());
        let last = app
            .active_session()
            .and_then(|s| s.messages.last())
            .expect("reply");
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text(), "echo: ping");
    }
}
