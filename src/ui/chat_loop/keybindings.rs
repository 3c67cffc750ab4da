//! Key resolution per UI mode.
//!
//! Resolution is pure: it maps a key event to a [`KeyAction`] without
//! touching the app, so the bindings can be tested on their own.

use crate::core::app::{PickerKind, UiMode};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    InsertNewline,
    NewSession,
    DeleteSession,
    CycleSession(isize),
    OpenPicker(PickerKind),
    EditPrompt,
    ToggleToolCalls,
    ScrollUp,
    ScrollDown,
    ScrollToBottom,
    ClearStatus,
    PickerUp,
    PickerDown,
    PickerStart,
    PickerEnd,
    Confirm,
    Cancel,
    ApplyPrompt,
    SaveTemplate,
    /// Pass the key to the focused text area.
    Edit,
    Ignore,
}

/// Which bindings apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Typing,
    Picker,
    PromptEditor,
    TemplateName,
}

impl From<&UiMode> for KeyContext {
    fn from(mode: &UiMode) -> Self {
        match mode {
            UiMode::Typing => KeyContext::Typing,
            UiMode::Picker { .. } => KeyContext::Picker,
            UiMode::PromptEditor(_) => KeyContext::PromptEditor,
            UiMode::TemplateName(_) => KeyContext::TemplateName,
        }
    }
}

pub fn resolve(context: KeyContext, key: &KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    if ctrl && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    match context {
        KeyContext::Typing => match key.code {
            KeyCode::Enter if alt || shift => KeyAction::InsertNewline,
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Char('n') if ctrl => KeyAction::NewSession,
            KeyCode::Char('w') if ctrl => KeyAction::DeleteSession,
            KeyCode::Char('l') if ctrl => KeyAction::OpenPicker(PickerKind::Session),
            KeyCode::Char('p') if ctrl => KeyAction::OpenPicker(PickerKind::Model),
            KeyCode::Char('t') if ctrl => KeyAction::OpenPicker(PickerKind::Template),
            KeyCode::Char('e') if ctrl => KeyAction::EditPrompt,
            KeyCode::Char('g') if ctrl => KeyAction::ToggleToolCalls,
            KeyCode::Up if alt => KeyAction::CycleSession(-1),
            KeyCode::Down if alt => KeyAction::CycleSession(1),
            KeyCode::PageUp => KeyAction::ScrollUp,
            KeyCode::PageDown => KeyAction::ScrollDown,
            KeyCode::End if ctrl => KeyAction::ScrollToBottom,
            KeyCode::Esc => KeyAction::ClearStatus,
            _ => KeyAction::Edit,
        },
        KeyContext::Picker => match key.code {
            KeyCode::Up | KeyCode::Char('k') => KeyAction::PickerUp,
            KeyCode::Down | KeyCode::Char('j') => KeyAction::PickerDown,
            KeyCode::Home => KeyAction::PickerStart,
            KeyCode::End => KeyAction::PickerEnd,
            KeyCode::Enter => KeyAction::Confirm,
            KeyCode::Esc => KeyAction::Cancel,
            _ => KeyAction::Ignore,
        },
        KeyContext::PromptEditor => match key.code {
            KeyCode::Esc => KeyAction::ApplyPrompt,
            KeyCode::Char('s') if ctrl => KeyAction::SaveTemplate,
            KeyCode::Char('x') if ctrl => KeyAction::Cancel,
            _ => KeyAction::Edit,
        },
        KeyContext::TemplateName => match key.code {
            KeyCode::Enter => KeyAction::Confirm,
            KeyCode::Esc => KeyAction::Cancel,
            _ => KeyAction::Edit,
        },
    }
}
