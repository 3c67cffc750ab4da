//! Slash commands typed into the chat input.

mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use crate::core::app::{App, PickerKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
}

const KEY_HELP: &str = "\
## Keys
- `Enter` send, `Alt+Enter` new line
- `Ctrl+N` new chat, `Ctrl+W` delete chat, `Alt+Up`/`Alt+Down` previous/next chat
- `Ctrl+L` chats, `Ctrl+P` models, `Ctrl+T` templates
- `Ctrl+E` edit system prompt (`Esc` apply, `Ctrl+S` save as template, `Ctrl+X` discard)
- `Ctrl+G` show/hide tool calls, `PageUp`/`PageDown` scroll, `Ctrl+C` quit";

/// Run `input` as a command when it names one; anything else is a message.
pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

fn report<T, E: std::fmt::Display>(app: &mut App, result: Result<T, E>) -> CommandResult {
    if let Err(err) = result {
        app.ui.set_status(err.to_string());
    }
    CommandResult::Continue
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help_md = String::from("## Commands\n");
    for command in all_commands() {
        help_md.push_str(&format!("- `{}`: {}\n", command.usage, command.help));
    }
    help_md.push('\n');
    help_md.push_str(KEY_HELP);
    app.add_notice(help_md);
    CommandResult::Continue
}

pub(super) fn handle_new(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.new_session();
    CommandResult::Continue
}

pub(super) fn handle_delete(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let result = if invocation.args.is_empty() {
        app.delete_active_session()
    } else {
        app.delete_session(invocation.args)
    };
    report(app, result)
}

pub(super) fn handle_switch(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.ui.set_status("Usage: /switch <id>");
        return CommandResult::Continue;
    }
    let result = app.select_session(invocation.args);
    report(app, result)
}

pub(super) fn handle_sessions(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.open_picker(PickerKind::Session);
    CommandResult::Continue
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.open_picker(PickerKind::Model);
        return CommandResult::Continue;
    }
    let result = app.set_model(invocation.args);
    report(app, result)
}

pub(super) fn handle_template(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.open_picker(PickerKind::Template);
        return CommandResult::Continue;
    }
    let result = app.apply_template(invocation.args);
    report(app, result)
}

pub(super) fn handle_save(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.ui.set_status("Usage: /save <name>");
        return CommandResult::Continue;
    }
    let result = app.save_template(invocation.args);
    report(app, result)
}

pub(super) fn handle_prompt(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        app.open_prompt_editor();
    } else {
        app.set_system_prompt(invocation.args);
        app.ui.set_status("System prompt updated");
    }
    CommandResult::Continue
}

pub(super) fn handle_tools(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.args.to_ascii_lowercase().as_str() {
        "" => app.toggle_tool_calls(),
        "on" => app.set_show_tool_calls(true),
        "off" => app.set_show_tool_calls(false),
        _ => app.ui.set_status("Usage: /tools [on|off]"),
    }
    CommandResult::Continue
}

#[cfg(test)]
mod tests;
