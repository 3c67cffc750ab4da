use crate::commands::matching_commands;
use crate::core::app::{App, UiMode};
use crate::ui::picker::PickerState;
use crate::ui::theme::Theme;
use crate::ui::transcript::build_lines;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use tui_textarea::TextArea;

const SIDEBAR_WIDTH: u16 = 30;
const MAX_INPUT_LINES: u16 = 8;

/// Draw the whole screen. Returns the largest useful scroll offset for the
/// transcript so the caller can clamp its own.
pub fn ui(f: &mut Frame, app: &App, theme: &Theme) -> u16 {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(f.area());

    render_sidebar(f, app, theme, columns[0]);

    let input_lines = (app.ui.input().lines().len() as u16).clamp(1, MAX_INPUT_LINES);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(input_lines + 2), // borders
            Constraint::Length(1),
        ])
        .split(columns[1]);

    let max_scroll = render_transcript(f, app, theme, rows[0]);
    render_input(f, app, theme, rows[1]);
    render_status(f, app, theme, rows[2]);

    match &app.ui.mode {
        UiMode::Typing => {}
        UiMode::Picker { state, .. } => render_picker(f, state, theme),
        UiMode::PromptEditor(editor) => render_prompt_editor(f, editor, theme),
        UiMode::TemplateName(input) => render_template_name(f, input, theme),
    }

    max_scroll
}

fn render_sidebar(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(theme.border_style)
        .title(Span::styled("Chats", theme.title_style));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let session_count = app.sessions.len() as u16;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(session_count + 1), Constraint::Min(0)])
        .split(inner);

    let items: Vec<ListItem> = app
        .sessions
        .ids()
        .map(|id| {
            let active = id == app.active_id();
            let marker = if active { "▸ " } else { "  " };
            let style = if active {
                theme.sidebar_active_style
            } else {
                theme.sidebar_item_style
            };
            let mut spans = vec![Span::styled(format!("{marker}{id}"), style)];
            if app.pending_session() == Some(id) {
                spans.push(Span::styled(" …", theme.busy_indicator_style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    f.render_widget(List::new(items), parts[0]);

    let session = app.active_session();
    let model = app.active_model().unwrap_or("(none)");
    let template = session
        .and_then(|s| s.template.as_deref())
        .unwrap_or("(none)");
    let tool_calls = if app.show_tool_calls { "shown" } else { "hidden" };
    let details = vec![
        Line::from(Span::styled("Model", theme.sidebar_label_style)),
        Line::from(Span::styled(format!("  {model}"), theme.sidebar_item_style)),
        Line::from(Span::styled("Template", theme.sidebar_label_style)),
        Line::from(Span::styled(format!("  {template}"), theme.sidebar_item_style)),
        Line::from(Span::styled("Tool calls", theme.sidebar_label_style)),
        Line::from(Span::styled(format!("  {tool_calls}"), theme.sidebar_item_style)),
        Line::default(),
        Line::from(Span::styled(
            "^N new  ^W delete  ^L chats",
            theme.detail_style,
        )),
        Line::from(Span::styled(
            "^P model  ^T template  ^E prompt",
            theme.detail_style,
        )),
    ];
    f.render_widget(Paragraph::new(details).wrap(Wrap { trim: false }), parts[1]);
}

fn render_transcript(f: &mut Frame, app: &App, theme: &Theme, area: Rect) -> u16 {
    let messages = app
        .active_session()
        .map(|session| session.messages.as_slice())
        .unwrap_or_default();
    let lines = build_lines(messages, app.show_tool_calls, theme);

    let title = format!(
        "casual-chat v{} • {}",
        env!("CARGO_PKG_VERSION"),
        app.active_id()
    );
    let block = Block::default().title(Span::styled(title, theme.title_style));
    let inner = block.inner(area);

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total = wrapped_height(&paragraph, inner.width);
    let max_scroll = total.saturating_sub(inner.height);
    // The offset counts up from the bottom of the transcript.
    let top = max_scroll.saturating_sub(app.ui.scroll_offset.min(max_scroll));

    f.render_widget(paragraph.block(block).scroll((top, 0)), area);
    max_scroll
}

/// Rows the paragraph needs at `width`, saturating at `u16::MAX`.
fn wrapped_height(paragraph: &Paragraph, width: u16) -> u16 {
    u16::try_from(paragraph.line_count(width)).unwrap_or(u16::MAX)
}

fn render_input(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = if app.is_busy() {
        "Waiting for reply… (Enter is disabled, /help for commands)"
    } else {
        "Message (Enter to send, Alt+Enter for new line, /help for commands)"
    };
    let mut input = app.ui.input().clone();
    input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style)
            .title(Span::styled(title, theme.title_style)),
    );
    input.set_style(theme.input_text_style);
    input.set_cursor_line_style(theme.input_cursor_line_style);
    if app.ui.is_typing() {
        input.set_cursor_style(theme.input_cursor_style);
    } else {
        input.set_cursor_style(theme.input_text_style);
    }
    f.render_widget(&input, area);
}

fn render_status(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let mut spans = Vec::new();
    if app.is_busy() {
        spans.push(Span::styled("● ", theme.busy_indicator_style));
    }
    if let Some(hint) = command_hint(app) {
        spans.push(Span::styled(hint, theme.detail_style));
    } else if let Some(status) = &app.ui.status {
        spans.push(Span::styled(status.clone(), theme.status_style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Usage of the commands matching a partly typed `/command`.
fn command_hint(app: &App) -> Option<String> {
    if !app.ui.is_typing() {
        return None;
    }
    let input = app.ui.input_text();
    if !input.starts_with('/') || input.contains(char::is_whitespace) {
        return None;
    }
    let usages: Vec<&str> = matching_commands(&input)
        .into_iter()
        .map(|command| command.usage)
        .collect();
    (!usages.is_empty()).then(|| usages.join("  "))
}

fn render_picker(f: &mut Frame, state: &PickerState, theme: &Theme) {
    let height = (state.items.len() as u16 + 2).min(f.area().height.saturating_sub(4));
    let area = centered_rect(60, height, f.area());
    let items: Vec<ListItem> = state
        .items
        .iter()
        .map(|item| {
            let mut spans = vec![Span::raw(item.label.clone())];
            if let Some(detail) = &item.detail {
                spans.push(Span::styled(format!("  {detail}"), theme.detail_style));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let title = format!("{} (↑/↓ move, Enter select, Esc cancel)", state.title);
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style)
                .title(Span::styled(title, theme.title_style)),
        )
        .highlight_style(theme.selection_style)
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_prompt_editor(f: &mut Frame, editor: &TextArea<'static>, theme: &Theme) {
    let screen = f.area();
    let width = screen.width.saturating_mul(4) / 5;
    let height = screen.height.saturating_mul(7) / 10;
    let area = centered_rect(width, height, screen);
    render_overlay_editor(
        f,
        editor,
        theme,
        area,
        "System Prompt (Esc apply, Ctrl+S save as template, Ctrl+X discard)",
    );
}

fn render_template_name(f: &mut Frame, input: &TextArea<'static>, theme: &Theme) {
    let area = centered_rect(50, 3, f.area());
    render_overlay_editor(
        f,
        input,
        theme,
        area,
        "Save template as (Enter save, Esc cancel)",
    );
}

fn render_overlay_editor(
    f: &mut Frame,
    editor: &TextArea<'static>,
    theme: &Theme,
    area: Rect,
    title: &str,
) {
    let mut editor = editor.clone();
    editor.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style)
            .title(Span::styled(title.to_string(), theme.title_style)),
    );
    editor.set_style(theme.input_text_style);
    editor.set_cursor_style(theme.input_cursor_style);
    editor.set_cursor_line_style(theme.input_cursor_line_style);
    f.render_widget(Clear, area);
    f.render_widget(&editor, area);
}

/// A `width` x `height` rectangle centered in `area`, clipped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
