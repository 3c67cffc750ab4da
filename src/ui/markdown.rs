//! Markdown to styled terminal lines.

use crate::ui::theme::Theme;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const QUOTE_PREFIX: &str = "│ ";
const CODE_INDENT: &str = "  ";
const RULE_WIDTH: usize = 24;

#[derive(Clone, Debug)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct MarkdownRenderer<'a> {
    theme: &'a Theme,
    content: &'a str,
    base_style: Style,
    style_stack: Vec<Style>,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    list_stack: Vec<ListKind>,
    /// Marker widths of the enclosing list items.
    list_indent_stack: Vec<usize>,
    quote_depth: usize,
    in_code_block: bool,
    code_block: String,
    link_stack: Vec<String>,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(content: &'a str, base_style: Style, theme: &'a Theme) -> Self {
        Self {
            theme,
            content,
            base_style,
            style_stack: Vec::new(),
            lines: Vec::new(),
            current: Vec::new(),
            list_stack: Vec::new(),
            list_indent_stack: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            code_block: String::new(),
            link_stack: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or(self.base_style)
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn line_prefix(&self, first_line_of_item: bool) -> Vec<Span<'static>> {
        let mut prefix = Vec::new();
        if self.quote_depth > 0 {
            prefix.push(Span::styled(
                QUOTE_PREFIX.repeat(self.quote_depth),
                self.theme.quote_style,
            ));
        }
        let indent: usize = if first_line_of_item {
            self.list_indent_stack
                .iter()
                .take(self.list_indent_stack.len().saturating_sub(1))
                .sum()
        } else {
            self.list_indent_stack.iter().sum()
        };
        if indent > 0 {
            prefix.push(Span::raw(" ".repeat(indent)));
        }
        prefix
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.current.is_empty() {
            self.current = self.line_prefix(false);
        }
        self.current.push(span);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    fn push_empty_line(&mut self) {
        self.flush();
        if self
            .lines
            .last()
            .map(|line| line.width() > 0)
            .unwrap_or(false)
        {
            self.lines.push(Line::default());
        }
    }

    fn finalize_code_block(&mut self) {
        self.flush();
        let source = std::mem::take(&mut self.code_block);
        let source = source.strip_suffix('\n').unwrap_or(&source);
        for text in source.split('\n').map(detab) {
            let mut spans = self.line_prefix(false);
            spans.push(Span::styled(
                format!("{CODE_INDENT}{text}"),
                self.theme.code_block_style,
            ));
            self.lines.push(Line::from(spans));
        }
        self.in_code_block = false;
        self.push_empty_line();
    }

    fn render(mut self) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        let parser = Parser::new_ext(self.content, options);

        for event in parser {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Heading { .. } => {
                        self.flush();
                        self.style_stack.push(self.theme.heading_style);
                    }
                    Tag::BlockQuote(_) => {
                        self.flush();
                        self.quote_depth += 1;
                        self.style_stack.push(self.theme.quote_style);
                    }
                    Tag::List(start) => {
                        self.flush();
                        self.list_stack.push(match start {
                            Some(n) => ListKind::Ordered(n),
                            None => ListKind::Unordered,
                        });
                        self.list_indent_stack.push(0);
                    }
                    Tag::Item => {
                        self.flush();
                        let marker = match self.list_stack.last_mut() {
                            Some(ListKind::Ordered(n)) => {
                                let current = *n;
                                *n += 1;
                                format!("{current}. ")
                            }
                            _ => "• ".to_string(),
                        };
                        if let Some(indent) = self.list_indent_stack.last_mut() {
                            *indent = unicode_width::UnicodeWidthStr::width(marker.as_str());
                        }
                        self.current = self.line_prefix(true);
                        self.current.push(Span::styled(marker, self.base_style));
                    }
                    Tag::CodeBlock(_) => {
                        self.flush();
                        self.in_code_block = true;
                        self.code_block.clear();
                    }
                    Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
                    Tag::Strong => self.push_modifier(Modifier::BOLD),
                    Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
                    Tag::Link { dest_url, .. } => {
                        self.link_stack.push(dest_url.to_string());
                        self.style_stack.push(self.theme.link_style);
                    }
                    _ => {}
                },
                Event::End(tag_end) => match tag_end {
                    TagEnd::Paragraph => {
                        self.flush();
                        if self.list_stack.is_empty() {
                            self.push_empty_line();
                        }
                    }
                    TagEnd::Heading(_) => {
                        self.style_stack.pop();
                        self.push_empty_line();
                    }
                    TagEnd::BlockQuote(_) => {
                        self.flush();
                        self.style_stack.pop();
                        self.quote_depth = self.quote_depth.saturating_sub(1);
                        if self.quote_depth == 0 {
                            self.push_empty_line();
                        }
                    }
                    TagEnd::List(_) => {
                        self.flush();
                        self.list_stack.pop();
                        self.list_indent_stack.pop();
                        if self.list_stack.is_empty() {
                            self.push_empty_line();
                        }
                    }
                    TagEnd::Item => self.flush(),
                    TagEnd::CodeBlock => self.finalize_code_block(),
                    TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                        self.style_stack.pop();
                    }
                    TagEnd::Link => {
                        self.style_stack.pop();
                        if let Some(url) = self.link_stack.pop() {
                            let label_is_url = self
                                .current
                                .last()
                                .map(|span| span.content.as_ref() == url)
                                .unwrap_or(false);
                            if !url.is_empty() && !label_is_url {
                                self.push_span(Span::styled(
                                    format!(" ({url})"),
                                    self.theme.detail_style,
                                ));
                            }
                        }
                    }
                    _ => {}
                },
                Event::Text(text) => {
                    if self.in_code_block {
                        self.code_block.push_str(&text);
                    } else {
                        let style = self.style();
                        self.push_span(Span::styled(detab(&text), style));
                    }
                }
                Event::Code(code) => {
                    self.push_span(Span::styled(detab(&code), self.theme.inline_code_style));
                }
                Event::SoftBreak => {
                    let style = self.style();
                    self.push_span(Span::styled(" ", style));
                }
                Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.flush();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(RULE_WIDTH),
                        self.theme.detail_style,
                    )));
                    self.push_empty_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_span(Span::styled(marker, self.base_style));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.style();
                    self.push_span(Span::styled(html.trim_end().to_string(), style));
                }
                _ => {}
            }
        }

        if self.in_code_block {
            self.finalize_code_block();
        }
        self.flush();
        while self
            .lines
            .last()
            .map(|line| line.width() == 0)
            .unwrap_or(false)
        {
            self.lines.pop();
        }
        self.lines
    }
}

fn detab(text: &str) -> String {
    text.replace('\t', "    ")
}

/// Render markdown into lines styled on top of `base_style`.
pub fn render_markdown(content: &str, base_style: Style, theme: &Theme) -> Vec<Line<'static>> {
    MarkdownRenderer::new(content, base_style, theme).render()
}
