//! System-prompt templates stored as `*.j2` files.
//!
//! Templates are plain prompt text that may use minijinja expressions. The
//! raw source is what the prompt editor shows; rendering happens right
//! before a turn is sent so date variables are always current.

use crate::core::config::data::path_display;
use crate::core::constants::{DEFAULT_TEMPLATES_DIR, TEMPLATE_EXTENSION};
use chrono::{DateTime, Local};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum TemplateError {
    /// The name cannot be used as a file stem.
    InvalidName(String),
    NotFound { name: String, path: PathBuf },
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::InvalidName(name) => write!(f, "Invalid template name: '{name}'"),
            TemplateError::NotFound { name, path } => {
                write!(f, "Template '{name}' not found at {}", path_display(path))
            }
            TemplateError::Io { path, source } => {
                write!(f, "Template I/O error at {}: {source}", path_display(path))
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATES_DIR)
    }
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template names (file stems), sorted. A missing directory has no templates.
    pub fn list(&self) -> Result<Vec<String>, TemplateError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(TemplateError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == TEMPLATE_EXTENSION)
                    .unwrap_or(false)
            })
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(TemplateError::NotFound {
                name: name.to_string(),
                path,
            }),
            Err(source) => Err(TemplateError::Io { path, source }),
        }
    }

    /// Write a template, replacing any existing file with the same name.
    pub fn save(&self, name: &str, content: &str) -> Result<PathBuf, TemplateError> {
        let path = self.path_for(name)?;
        let io_err = |source| TemplateError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp_file.write_all(content.as_bytes()).map_err(io_err)?;
        temp_file.as_file_mut().sync_all().map_err(io_err)?;
        temp_file
            .persist(&path)
            .map_err(|err| io_err(err.error))?;
        debug!(path = %path.display(), bytes = content.len(), "Saved prompt template");
        Ok(path)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let name = validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{TEMPLATE_EXTENSION}")))
    }
}

fn validate_name(name: &str) -> Result<&str, TemplateError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\'])
        || trimmed.chars().any(char::is_control);
    if invalid {
        return Err(TemplateError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

/// Values exposed to system prompt templates.
#[derive(Debug, Clone, Serialize)]
pub struct PromptVars {
    pub current_date: String,
    pub current_time: String,
    pub model: String,
    pub tools: Vec<String>,
}

impl PromptVars {
    pub fn new(model: impl Into<String>, tools: Vec<String>) -> Self {
        Self::at(Local::now(), model, tools)
    }

    pub fn at(now: DateTime<Local>, model: impl Into<String>, tools: Vec<String>) -> Self {
        Self {
            current_date: now.format("%Y-%m-%d").to_string(),
            current_time: now.format("%H:%M").to_string(),
            model: model.into(),
            tools,
        }
    }
}

fn render_prompt_template(template: &str, vars: &PromptVars) -> Result<String, String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_template("system_prompt", template)
        .map_err(|error| error.to_string())?;

    env.get_template("system_prompt")
        .map_err(|error| error.to_string())?
        .render(vars)
        .map_err(|error| error.to_string())
}

/// Render a system prompt. Prompts that fail to render are used verbatim.
pub fn render_system_prompt(source: &str, vars: &PromptVars) -> String {
    match render_prompt_template(source, vars) {
        Ok(rendered) => rendered,
        Err(error) => {
            warn!(%error, "Failed to render system prompt template; using raw text");
            source.to_string()
        }
    }
}
