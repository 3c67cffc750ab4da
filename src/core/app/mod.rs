//! Application state: sessions, the active configuration and UI state, plus
//! every operation the UI can perform on them.

mod pickers;
pub mod ui_state;

pub use ui_state::{PickerKind, UiMode, UiState};

use crate::core::config::ChatConfig;
use crate::core::constants::DEFAULT_SYSTEM_PROMPT;
use crate::core::message::ChatMessage;
use crate::core::providers::ChatError;
use crate::core::session::{DeleteOutcome, Session, SessionError, SessionStore};
use crate::core::templates::{TemplateError, TemplateStore};
use crate::core::tool_chat::ChatTurn;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug)]
pub enum AppError {
    Session(SessionError),
    Template(TemplateError),
    UnknownModel(String),
    /// A chat turn is still running.
    Busy,
    NoModel,
    EmptyMessage,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(err) => write!(f, "{err}"),
            AppError::Template(err) => write!(f, "{err}"),
            AppError::UnknownModel(name) => write!(f, "Unknown model: {name}"),
            AppError::Busy => write!(f, "Still waiting for the previous reply"),
            AppError::NoModel => write!(f, "Select a model first"),
            AppError::EmptyMessage => write!(f, "Nothing to send"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Session(err) => Some(err),
            AppError::Template(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        AppError::Template(err)
    }
}

pub struct App {
    pub config: ChatConfig,
    pub sessions: SessionStore,
    pub templates: TemplateStore,
    pub show_tool_calls: bool,
    pub ui: UiState,
    /// Session whose turn is in flight. May name a deleted session until
    /// that turn's outcome arrives.
    pending: Option<String>,
}

impl App {
    /// Build the app with one fresh session. `model` overrides the config's
    /// default model.
    pub fn new(
        config: ChatConfig,
        templates: TemplateStore,
        model: Option<&str>,
    ) -> Result<Self, AppError> {
        let model = match model {
            Some(name) if config.has_model(name) => Some(name.to_string()),
            Some(name) => return Err(AppError::UnknownModel(name.to_string())),
            None => config.default_model().map(str::to_string),
        };
        let mut sessions = SessionStore::new();
        sessions.create(model, Some(DEFAULT_SYSTEM_PROMPT.to_string()), None);
        Ok(Self {
            config,
            sessions,
            templates,
            show_tool_calls: false,
            ui: UiState::new(),
            pending: None,
        })
    }

    pub fn active_id(&self) -> &str {
        self.sessions.active_id().unwrap_or_default()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.sessions.active()
    }

    pub fn active_model(&self) -> Option<&str> {
        self.sessions.active().and_then(|s| s.model.as_deref())
    }

    pub fn active_system_prompt(&self) -> &str {
        self.sessions
            .active()
            .and_then(|s| s.system_prompt.as_deref())
            .unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_session(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Start a new chat that inherits the active chat's model, system
    /// prompt and template.
    pub fn new_session(&mut self) -> String {
        let (model, prompt, template) = match self.sessions.active() {
            Some(session) => (
                session.model.clone(),
                session.system_prompt.clone(),
                session.template.clone(),
            ),
            None => (
                self.config.default_model().map(str::to_string),
                Some(DEFAULT_SYSTEM_PROMPT.to_string()),
                None,
            ),
        };
        let id = self.sessions.create(model, prompt, template);
        self.ui.scroll_to_bottom();
        self.ui.set_status(format!("Started {id}"));
        debug!(session = %id, "Created session");
        id
    }

    pub fn select_session(&mut self, id: &str) -> Result<(), AppError> {
        self.sessions.select(id)?;
        self.ui.scroll_to_bottom();
        self.ui.set_status(format!("Switched to {id}"));
        Ok(())
    }

    /// Move to the chat `offset` places away from the active one.
    pub fn cycle_session(&mut self, offset: isize) {
        if let Some(id) = self.sessions.neighbor_of_active(offset).map(str::to_string) {
            let _ = self.select_session(&id);
        }
    }

    /// Delete a chat. Deleting the last chat starts a fresh one with the
    /// default system prompt.
    pub fn delete_session(&mut self, id: &str) -> Result<(), AppError> {
        let outcome = self.sessions.delete(id)?;
        // The turn keeps running; `pending` stays set until its outcome
        // arrives so a second turn cannot overlap it.
        let orphaned = self.pending.as_deref() == Some(id);
        if orphaned {
            debug!(session = %id, "Pending turn now belongs to a deleted session");
        }
        match outcome {
            DeleteOutcome::Emptied => {
                let model = self.config.default_model().map(str::to_string);
                let new_id =
                    self.sessions
                        .create(model, Some(DEFAULT_SYSTEM_PROMPT.to_string()), None);
                self.ui.set_status(format!("Deleted {id}; started {new_id}"));
            }
            DeleteOutcome::Switched { active } => {
                self.ui.set_status(format!("Deleted {id}; now on {active}"));
            }
            DeleteOutcome::Removed => {
                self.ui.set_status(format!("Deleted {id}"));
            }
        }
        if orphaned {
            if let Some(status) = self.ui.status.as_mut() {
                status.push_str(" (its pending reply will be discarded)");
            }
        }
        self.ui.scroll_to_bottom();
        Ok(())
    }

    pub fn delete_active_session(&mut self) -> Result<(), AppError> {
        let id = self.active_id().to_string();
        self.delete_session(&id)
    }

    pub fn set_model(&mut self, name: &str) -> Result<(), AppError> {
        if !self.config.has_model(name) {
            return Err(AppError::UnknownModel(name.to_string()));
        }
        if let Some(session) = self.sessions.active_mut() {
            session.model = Some(name.to_string());
        }
        self.ui.set_status(format!("Model set: {name}"));
        Ok(())
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        if let Some(session) = self.sessions.active_mut() {
            session.system_prompt = Some(prompt.into());
        }
    }

    /// Load a template into the active chat's system prompt.
    pub fn apply_template(&mut self, name: &str) -> Result<(), AppError> {
        let content = self.templates.load(name)?;
        if let Some(session) = self.sessions.active_mut() {
            session.system_prompt = Some(content);
            session.template = Some(name.trim().to_string());
        }
        self.ui.set_status(format!("Template loaded: {}", name.trim()));
        Ok(())
    }

    /// Save the active chat's system prompt as a template.
    pub fn save_template(&mut self, name: &str) -> Result<PathBuf, AppError> {
        let prompt = self.active_system_prompt().to_string();
        let path = self.templates.save(name, &prompt)?;
        if let Some(session) = self.sessions.active_mut() {
            session.template = Some(name.trim().to_string());
        }
        info!(template = %name.trim(), "Saved system prompt template");
        self.ui.set_status(format!("Template saved: {}", name.trim()));
        Ok(path)
    }

    pub fn set_show_tool_calls(&mut self, show: bool) {
        self.show_tool_calls = show;
        self.ui.set_status(if show {
            "Showing tool calls"
        } else {
            "Hiding tool calls"
        });
    }

    pub fn toggle_tool_calls(&mut self) {
        self.set_show_tool_calls(!self.show_tool_calls);
    }

    /// Record the user's message and return the turn to run.
    pub fn submit_message(&mut self, text: &str) -> Result<ChatTurn, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::EmptyMessage);
        }
        if self.pending.is_some() {
            return Err(AppError::Busy);
        }
        let session_id = self.active_id().to_string();
        let session = self
            .sessions
            .active_mut()
            .ok_or_else(|| AppError::Session(SessionError::NotFound(session_id.clone())))?;
        let model = session.model.clone().ok_or(AppError::NoModel)?;

        session.messages.push(ChatMessage::user(text));
        let turn = ChatTurn {
            session_id: session_id.clone(),
            model,
            system_prompt: session.system_prompt.clone(),
            messages: session
                .messages
                .iter()
                .filter(|message| message.role.is_api())
                .cloned()
                .collect(),
        };
        self.pending = Some(session_id);
        self.ui.scroll_to_bottom();
        self.ui.set_status("Thinking...");
        Ok(turn)
    }

    /// Apply a finished turn to the session it came from. Returns false when
    /// that session no longer exists.
    pub fn finish_chat(
        &mut self,
        session_id: &str,
        result: Result<Vec<ChatMessage>, ChatError>,
    ) -> bool {
        if self.pending.as_deref() == Some(session_id) {
            self.pending = None;
        }
        let Some(session) = self.sessions.get_mut(session_id) else {
            debug!(session = %session_id, "Discarding reply for deleted session");
            return false;
        };
        match result {
            Ok(messages) => {
                session.messages.extend(messages);
                self.ui.clear_status();
            }
            Err(err) => {
                session.messages.push(ChatMessage::app_error(err.to_string()));
                self.ui.set_status("Error: chat request failed");
            }
        }
        true
    }

    /// Append an informational notice to the active chat's transcript.
    pub fn add_notice(&mut self, text: impl Into<String>) {
        if let Some(session) = self.sessions.active_mut() {
            session.messages.push(ChatMessage::app_info(text));
        }
    }
}

#[cfg(test)]
mod tests;
