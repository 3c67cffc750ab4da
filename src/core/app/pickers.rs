use super::ui_state::{text_area_text, text_area_with};
use super::{App, AppError, PickerKind, UiMode};
use crate::ui::picker::{PickerItem, PickerState};
use tui_textarea::TextArea;

const SESSION_PREVIEW_CHARS: usize = 40;

/// Collapse whitespace and cut long text for a one-line label.
fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut cut: String = collapsed.chars().take(max_chars).collect();
        cut.push('…');
        cut
    }
}

impl App {
    pub fn open_picker(&mut self, kind: PickerKind) {
        let (items, current) = match kind {
            PickerKind::Model => (self.model_items(), self.active_model().map(str::to_string)),
            PickerKind::Template => match self.templates.list() {
                Ok(names) => {
                    let current = self.active_session().and_then(|s| s.template.clone());
                    (names.into_iter().map(|n| PickerItem::new(n.clone(), n)).collect(), current)
                }
                Err(err) => {
                    self.ui.set_status(err.to_string());
                    return;
                }
            },
            PickerKind::Session => (self.session_items(), Some(self.active_id().to_string())),
        };
        if items.is_empty() {
            let message = match kind {
                PickerKind::Template => format!(
                    "No templates in {}",
                    self.templates.dir().display()
                ),
                _ => "Nothing to pick".to_string(),
            };
            self.ui.set_status(message);
            return;
        }
        let state = PickerState::new(kind.title(), items, current.as_deref());
        self.ui.mode = UiMode::Picker { kind, state };
    }

    fn model_items(&self) -> Vec<PickerItem> {
        self.config
            .models
            .iter()
            .map(|(name, model)| {
                PickerItem::new(name, name).with_detail(format!(
                    "{} via {}",
                    model.model,
                    model.provider.as_str()
                ))
            })
            .collect()
    }

    fn session_items(&self) -> Vec<PickerItem> {
        self.sessions
            .ids()
            .map(|id| {
                let first_user = self.sessions.get(id).and_then(|session| {
                    session
                        .messages
                        .iter()
                        .find(|m| m.role == crate::core::message::Role::User)
                        .map(|m| preview(m.text(), SESSION_PREVIEW_CHARS))
                });
                let item = PickerItem::new(id, id);
                match first_user {
                    Some(text) => item.with_detail(text),
                    None => item.with_detail("(empty)"),
                }
            })
            .collect()
    }

    pub fn picker_state_mut(&mut self) -> Option<&mut PickerState> {
        match &mut self.ui.mode {
            UiMode::Picker { state, .. } => Some(state),
            _ => None,
        }
    }

    /// Apply the highlighted picker entry and return to typing.
    pub fn confirm_picker(&mut self) -> Result<(), AppError> {
        let mode = std::mem::replace(&mut self.ui.mode, UiMode::Typing);
        let UiMode::Picker { kind, state } = mode else {
            self.ui.mode = mode;
            return Ok(());
        };
        let Some(id) = state.selected_id().map(str::to_string) else {
            return Ok(());
        };
        match kind {
            PickerKind::Model => self.set_model(&id),
            PickerKind::Template => self.apply_template(&id),
            PickerKind::Session => self.select_session(&id),
        }
    }

    /// Leave any overlay without applying it.
    pub fn cancel_mode(&mut self) {
        self.ui.mode = UiMode::Typing;
    }

    pub fn open_prompt_editor(&mut self) {
        let editor = text_area_with(self.active_system_prompt());
        self.ui.mode = UiMode::PromptEditor(editor);
    }

    pub fn prompt_editor_mut(&mut self) -> Option<&mut TextArea<'static>> {
        match &mut self.ui.mode {
            UiMode::PromptEditor(editor) | UiMode::TemplateName(editor) => Some(editor),
            _ => None,
        }
    }

    /// Store the editor's text as the active system prompt.
    pub fn apply_prompt_editor(&mut self) {
        let mode = std::mem::replace(&mut self.ui.mode, UiMode::Typing);
        match mode {
            UiMode::PromptEditor(editor) => {
                self.set_system_prompt(text_area_text(&editor));
                self.ui.set_status("System prompt updated");
            }
            other => self.ui.mode = other,
        }
    }

    /// Apply the editor's text, then ask for a template name.
    pub fn begin_template_save(&mut self) {
        if matches!(self.ui.mode, UiMode::PromptEditor(_)) {
            self.apply_prompt_editor();
        }
        let current = self
            .active_session()
            .and_then(|s| s.template.clone())
            .unwrap_or_default();
        self.ui.mode = UiMode::TemplateName(text_area_with(&current));
    }

    pub fn confirm_template_name(&mut self) -> Result<(), AppError> {
        let mode = std::mem::replace(&mut self.ui.mode, UiMode::Typing);
        let UiMode::TemplateName(input) = mode else {
            self.ui.mode = mode;
            return Ok(());
        };
        let name = text_area_text(&input);
        match self.save_template(&name) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.ui.mode = UiMode::TemplateName(input);
                Err(err)
            }
        }
    }
}
