use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub tool_call_style: Style,
    pub notice_text_style: Style,
    pub error_text_style: Style,

    // Markdown
    pub heading_style: Style,
    pub inline_code_style: Style,
    pub code_block_style: Style,
    pub quote_style: Style,
    pub link_style: Style,

    // Chrome
    pub title_style: Style,
    pub border_style: Style,
    pub sidebar_active_style: Style,
    pub sidebar_item_style: Style,
    pub sidebar_label_style: Style,
    pub status_style: Style,
    pub busy_indicator_style: Style,
    pub selection_style: Style,
    pub detail_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
    pub input_cursor_line_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_prefix_style: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            tool_call_style: Style::default().fg(Color::Yellow),
            notice_text_style: Style::default().fg(Color::DarkGray),
            error_text_style: Style::default().fg(Color::LightRed),

            heading_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
            inline_code_style: Style::default().fg(Color::LightYellow),
            code_block_style: Style::default().fg(Color::LightYellow),
            quote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),

            title_style: Style::default().fg(Color::Gray),
            border_style: Style::default().fg(Color::DarkGray),
            sidebar_active_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            sidebar_item_style: Style::default().fg(Color::Gray),
            sidebar_label_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(Color::Gray),
            busy_indicator_style: Style::default().fg(Color::Yellow),
            selection_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
            detail_style: Style::default().fg(Color::DarkGray),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_cursor_line_style: Style::default(),
        }
    }
}
