//! Turns a session's messages into transcript lines.

use crate::core::message::{ChatMessage, Role, ToolCall};
use crate::ui::markdown::render_markdown;
use crate::ui::theme::Theme;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// What the transcript shows for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    User(String),
    Assistant(String),
    ToolCall { name: String, arguments: String },
    Notice(String),
    Error(String),
}

/// Reduce messages to visible blocks. Tool results and system messages are
/// never shown; assistant tool-call requests only when `show_tool_calls`,
/// and then without their text.
pub fn blocks(messages: &[ChatMessage], show_tool_calls: bool) -> Vec<Block> {
    let mut blocks = Vec::new();
    for message in messages {
        match message.role {
            Role::User => blocks.push(Block::User(message.text().to_string())),
            Role::Assistant if message.has_tool_calls() => {
                // Only the calls are shown; any text riding along is dropped.
                if show_tool_calls {
                    blocks.extend(message.tool_calls.iter().map(tool_call_block));
                }
            }
            Role::Assistant => blocks.push(Block::Assistant(message.text().to_string())),
            Role::AppInfo => blocks.push(Block::Notice(message.text().to_string())),
            Role::AppError => blocks.push(Block::Error(message.text().to_string())),
            Role::System | Role::Tool => {}
        }
    }
    blocks
}

fn tool_call_block(call: &ToolCall) -> Block {
    let raw = call.function.arguments.trim();
    let arguments = if raw.is_empty() {
        String::new()
    } else {
        serde_json::from_str::<serde_json::Value>(raw)
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| raw.to_string())
    };
    Block::ToolCall {
        name: call.function.name.clone(),
        arguments,
    }
}

impl Block {
    /// Markdown source for the block body.
    fn markdown(&self) -> String {
        match self {
            Block::ToolCall { name, arguments } if arguments.is_empty() => {
                format!("Calling Tool: `{name}`")
            }
            Block::ToolCall { name, arguments } => {
                format!("Calling Tool: `{name}`\n\nArguments:\n\n```json\n{arguments}\n```")
            }
            Block::User(text) | Block::Assistant(text) | Block::Notice(text) | Block::Error(text) => {
                text.clone()
            }
        }
    }

    fn header(&self, theme: &Theme) -> Option<Span<'static>> {
        match self {
            Block::User(_) => Some(Span::styled("You", theme.user_prefix_style)),
            Block::Assistant(_) => Some(Span::styled("Assistant", theme.assistant_prefix_style)),
            Block::ToolCall { .. } => Some(Span::styled("Tool", theme.tool_call_style)),
            Block::Notice(_) => None,
            Block::Error(_) => Some(Span::styled("Error", theme.error_text_style)),
        }
    }

    fn body_style(&self, theme: &Theme) -> Style {
        match self {
            Block::User(_) => theme.user_text_style,
            Block::Assistant(_) => theme.assistant_text_style,
            Block::ToolCall { .. } => theme.tool_call_style,
            Block::Notice(_) => theme.notice_text_style,
            Block::Error(_) => theme.error_text_style,
        }
    }
}

/// Lines for the whole transcript, blocks separated by a blank line.
pub fn build_lines(
    messages: &[ChatMessage],
    show_tool_calls: bool,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for block in blocks(messages, show_tool_calls) {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        if let Some(header) = block.header(theme) {
            lines.push(Line::from(header));
        }
        let style = block.body_style(theme);
        match &block {
            // User text is shown as typed.
            Block::User(text) => lines.extend(
                text.lines()
                    .map(|line| Line::from(Span::styled(line.to_string(), style))),
            ),
            _ => lines.extend(render_markdown(&block.markdown(), style, theme)),
        }
    }
    lines
}
