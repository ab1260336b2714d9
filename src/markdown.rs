use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use unicode_width::UnicodeWidthStr;

// Narrower than this and wrapping degrades into one word per line.
const MIN_WIDTH: usize = 16;

/// Renders story text for the reader pane, word-wrapped to `width`
/// columns.
pub fn render(input: &str, width: usize) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(input, opts);
    let mut writer = Writer::new(width.max(MIN_WIDTH));
    writer.run(parser);
    writer.into_text()
}

/// Like [`render`], but when rendering yields nothing visible for a
/// non-empty input the raw text is shown instead of an empty pane.
pub fn render_or_raw(input: &str, width: usize) -> Text<'static> {
    let rendered = render(input, width);
    if input.trim().is_empty() || has_visible_content(&rendered) {
        rendered
    } else {
        raw_text(input, width.max(MIN_WIDTH))
    }
}

fn has_visible_content(text: &Text<'_>) -> bool {
    text.lines
        .iter()
        .any(|line| line.spans.iter().any(|span| !span.content.trim().is_empty()))
}

fn raw_text(input: &str, width: usize) -> Text<'static> {
    let mut lines = Vec::new();
    for source in input.lines() {
        if source.trim().is_empty() {
            lines.push(Line::default());
            continue;
        }
        for wrapped in textwrap::wrap(source, width) {
            lines.push(Line::from(Span::raw(wrapped.into_owned())));
        }
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    Text::from(lines)
}

struct ItemMeta {
    depth: usize,
    marker: String,
}

struct Writer {
    width: usize,
    lines: Vec<Line<'static>>,
    buf: String,
    heading: Option<u8>,
    quote_depth: usize,
    lists: Vec<Option<u64>>,
    item: Option<ItemMeta>,
    code: Option<String>,
    link: Option<String>,
}

impl Writer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            buf: String::new(),
            heading: None,
            quote_depth: 0,
            lists: Vec::new(),
            item: None,
            code: None,
            link: None,
        }
    }

    fn run<'a, I>(&mut self, parser: I)
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in parser {
            match event {
                Event::Start(tag) => self.start(tag),
                Event::End(tag) => self.end(tag),
                Event::Text(text) => {
                    if let Some(code) = self.code.as_mut() {
                        code.push_str(&text);
                    } else {
                        self.buf.push_str(&text);
                    }
                }
                Event::Code(code) => {
                    self.buf.push('`');
                    self.buf.push_str(&code);
                    self.buf.push('`');
                }
                Event::SoftBreak => self.buf.push(' '),
                Event::HardBreak => self.flush(),
                Event::Rule => {
                    self.flush();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(self.width.min(24)),
                        Style::default().fg(Color::DarkGray),
                    )));
                    self.blank();
                }
                Event::TaskListMarker(done) => {
                    self.buf.push_str(if done { "[x] " } else { "[ ] " });
                }
                Event::FootnoteReference(name) => {
                    self.buf.push('[');
                    self.buf.push_str(&name);
                    self.buf.push(']');
                }
                Event::Html(_) | Event::InlineHtml(_) => {}
            }
        }
        self.flush();
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.flush(),
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_depth(level));
            }
            Tag::BlockQuote => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last() {
                    Some(Some(index)) => format!("{index}."),
                    _ => "•".to_string(),
                };
                self.item = Some(ItemMeta { depth, marker });
            }
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.into_string()),
            Tag::Image { .. } => self.buf.push_str("[image] "),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                self.blank();
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
                self.blank();
            }
            TagEnd::BlockQuote => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    for line in code.trim_end_matches('\n').split('\n') {
                        self.lines.push(Line::from(Span::styled(
                            format!("  {line}"),
                            Style::default().fg(Color::Cyan),
                        )));
                    }
                    self.blank();
                }
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Item => {
                self.flush();
                self.item = None;
                if let Some(Some(index)) = self.lists.last_mut() {
                    *index += 1;
                }
            }
            TagEnd::Link => {
                if let Some(dest) = self.link.take() {
                    if !dest.is_empty() && !self.buf.contains(&dest) {
                        self.buf.push_str(" (");
                        self.buf.push_str(&dest);
                        self.buf.push(')');
                    }
                }
            }
            _ => {}
        }
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.buf);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if let Some(level) = self.heading {
            let style = heading_style(level);
            for wrapped in textwrap::wrap(text, self.width) {
                self.lines
                    .push(Line::from(Span::styled(wrapped.into_owned(), style)));
            }
            return;
        }

        if let Some(item) = &self.item {
            let lead = "  ".repeat(item.depth);
            let head_width = lead.width() + item.marker.width() + 1;
            let hang = " ".repeat(head_width);
            let body_width = self.width.saturating_sub(head_width).max(1);
            for (index, wrapped) in textwrap::wrap(text, body_width).into_iter().enumerate() {
                if index == 0 {
                    self.lines.push(Line::from(vec![
                        Span::raw(lead.clone()),
                        Span::styled(
                            format!("{} ", item.marker),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::raw(wrapped.into_owned()),
                    ]));
                } else {
                    self.lines.push(Line::from(vec![
                        Span::raw(hang.clone()),
                        Span::raw(wrapped.into_owned()),
                    ]));
                }
            }
            return;
        }

        if self.quote_depth > 0 {
            let prefix = format!("{} ", ">".repeat(self.quote_depth));
            let style = Style::default().fg(Color::Green);
            let body_width = self.width.saturating_sub(prefix.width()).max(1);
            for wrapped in textwrap::wrap(text, body_width) {
                self.lines.push(Line::from(vec![
                    Span::styled(prefix.clone(), style),
                    Span::styled(wrapped.into_owned(), style),
                ]));
            }
            return;
        }

        for wrapped in textwrap::wrap(text, self.width) {
            self.lines.push(Line::from(Span::raw(wrapped.into_owned())));
        }
    }

    /// Separates blocks with one blank line; never two.
    fn blank(&mut self) {
        let last_is_blank = matches!(self.lines.last(), Some(line) if line.spans.is_empty());
        if !self.lines.is_empty() && !last_is_blank {
            self.lines.push(Line::default());
        }
    }

    fn into_text(mut self) -> Text<'static> {
        while matches!(self.lines.last(), Some(line) if line.spans.is_empty()) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        Text::from(self.lines)
    }
}

fn heading_style(level: u8) -> Style {
    match level {
        1 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        2 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
