use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Commands whose name starts with `prefix`, for completion hints.
pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.trim_start_matches('/').to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show commands and key bindings.",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new chat with the current model and prompt.",
        handler: super::handle_new,
    },
    Command {
        name: "delete",
        usage: "/delete [id]",
        help: "Delete a chat (the current one by default).",
        handler: super::handle_delete,
    },
    Command {
        name: "switch",
        usage: "/switch <id>",
        help: "Switch to another chat.",
        handler: super::handle_switch,
    },
    Command {
        name: "sessions",
        usage: "/sessions",
        help: "Open the chat picker.",
        handler: super::handle_sessions,
    },
    Command {
        name: "model",
        usage: "/model [name]",
        help: "Open the model picker or switch models immediately.",
        handler: super::handle_model,
    },
    Command {
        name: "template",
        usage: "/template [name]",
        help: "Open the template picker or load a template into the system prompt.",
        handler: super::handle_template,
    },
    Command {
        name: "save",
        usage: "/save <name>",
        help: "Save the system prompt as a template.",
        handler: super::handle_save,
    },
    Command {
        name: "prompt",
        usage: "/prompt [text]",
        help: "Edit the system prompt, or replace it with the given text.",
        handler: super::handle_prompt,
    },
    Command {
        name: "tools",
        usage: "/tools [on|off]",
        help: "Show or hide tool calls in the transcript.",
        handler: super::handle_tools,
    },
];
