use crate::ui::picker::PickerState;
use tui_textarea::{CursorMove, TextArea};

/// What a picker selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Model,
    Template,
    Session,
}

impl PickerKind {
    pub fn title(self) -> &'static str {
        match self {
            PickerKind::Model => "Pick Model",
            PickerKind::Template => "Load Template",
            PickerKind::Session => "Switch Chat",
        }
    }
}

/// Current UI interaction mode.
#[derive(Debug, Clone)]
pub enum UiMode {
    /// Composing a chat message.
    Typing,

    /// Choosing from a list.
    Picker { kind: PickerKind, state: PickerState },

    /// Editing the active session's system prompt.
    PromptEditor(TextArea<'static>),

    /// Asking for the name to save the system prompt under.
    TemplateName(TextArea<'static>),
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub mode: UiMode,
    input: TextArea<'static>,
    pub status: Option<String>,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll_offset: u16,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            mode: UiMode::Typing,
            input: TextArea::default(),
            status: None,
            scroll_offset: 0,
        }
    }

    pub fn input(&self) -> &TextArea<'static> {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.input
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn set_input_text(&mut self, text: &str) {
        self.input = text_area_with(text);
    }

    /// Clear the input and return what it held.
    pub fn take_input(&mut self) -> String {
        let text = self.input_text();
        self.input = TextArea::default();
        text
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.mode, UiMode::Typing)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }
}

/// A text area pre-filled with `text`, cursor at the end.
pub fn text_area_with(text: &str) -> TextArea<'static> {
    let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut area = TextArea::from(lines);
    area.move_cursor(CursorMove::Bottom);
    area.move_cursor(CursorMove::End);
    area
}

/// Text of a text area with lines joined by newlines.
pub fn text_area_text(area: &TextArea<'_>) -> String {
    area.lines().join("\n")
}
