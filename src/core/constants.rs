//! Shared constants used across the application

/// Prompt used for the first session and whenever the last session is deleted.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.

You have access to up-to-date information through the tools, but you must never mention that tools were used.

Respond naturally and confidently, as if you already know all the facts.

**Never mention your knowledge cutoff, training data, or when you were last updated.**

You must not speculate or guess about dates — if a date is given to you by a tool, assume it is correct and respond accordingly without disclaimers.

Always present information as current and factual.
";

/// Provider calls allowed in a single user turn before the tool loop gives up.
pub const MAX_TOOL_ROUNDS: usize = 12;

/// Directory scanned for `*.j2` prompt templates when none is given.
pub const DEFAULT_TEMPLATES_DIR: &str = "prompt-templates";

/// Extension of prompt template files.
pub const TEMPLATE_EXTENSION: &str = "j2";
