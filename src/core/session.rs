//! In-memory chat sessions.
//!
//! Sessions are owned by the UI loop and never persisted. Ids have the form
//! `chat-N`, where `N` comes from a counter that only moves forward, so an id
//! is never handed out twice within a process.

use crate::core::message::ChatMessage;
use std::fmt;

/// One conversation: model choice, system prompt and history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    /// Name of the template the prompt was loaded from or saved as.
    pub template: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl Session {
    pub fn new(
        model: Option<String>,
        system_prompt: Option<String>,
        template: Option<String>,
    ) -> Self {
        Self {
            model,
            system_prompt,
            template,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NotFound(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound(id) => write!(f, "Session '{id}' not found"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Result of removing a session from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A non-active session was removed.
    Removed,
    /// The active session was removed and another one took its place.
    Switched { active: String },
    /// The last session was removed; the caller must create a new one.
    Emptied,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    entries: Vec<(String, Session)>,
    active: Option<String>,
    next_number: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            active: None,
            next_number: 1,
        }
    }

    /// Create a session, make it active and return its id.
    pub fn create(
        &mut self,
        model: Option<String>,
        system_prompt: Option<String>,
        template: Option<String>,
    ) -> String {
        let number = self.next_number.max(1);
        self.next_number = number + 1;
        let id = format!("chat-{number}");
        self.entries
            .push((id.clone(), Session::new(model, system_prompt, template)));
        self.active = Some(id.clone());
        id
    }

    pub fn select(&mut self, id: &str) -> Result<(), SessionError> {
        if self.position(id).is_none() {
            return Err(SessionError::NotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<DeleteOutcome, SessionError> {
        let index = self
            .position(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        self.entries.remove(index);

        if self.active.as_deref() != Some(id) {
            return Ok(DeleteOutcome::Removed);
        }

        match self.entries.first() {
            Some((next, _)) => {
                let next = next.clone();
                self.active = Some(next.clone());
                Ok(DeleteOutcome::Switched { active: next })
            }
            None => {
                self.active = None;
                Ok(DeleteOutcome::Emptied)
            }
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        let id = self.active.clone()?;
        self.get_mut(&id)
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, session)| session)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, session)| session)
    }

    /// Session ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Id of the session `offset` steps away from the active one, wrapping.
    pub fn neighbor_of_active(&self, offset: isize) -> Option<&str> {
        let len = self.entries.len() as isize;
        if len == 0 {
            return None;
        }
        let current = self
            .active
            .as_deref()
            .and_then(|id| self.position(id))
            .unwrap_or(0) as isize;
        let index = (current + offset).rem_euclid(len) as usize;
        self.entries.get(index).map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|(entry_id, _)| entry_id == id)
    }
}
