use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::hackernews::Hit;
use crate::launcher::Launcher;
use crate::markdown;

/// Styles used by the session. Passed in at construction; there is no
/// process-wide style state.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color,
    pub dim: Color,
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Yellow,
            dim: Color::DarkGray,
            border: Color::Blue,
        }
    }
}

impl Theme {
    /// Default theme with the accent swapped for a configured color name.
    /// Unknown names keep the default accent.
    pub fn with_accent(name: &str) -> Self {
        let mut theme = Self::default();
        if let Some(color) = parse_color(name) {
            theme.accent = color;
        }
        theme
    }
}

fn parse_color(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "yellow" => Some(Color::Yellow),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "blue" => Some(Color::Blue),
        "cyan" => Some(Color::Cyan),
        "magenta" => Some(Color::Magenta),
        "white" => Some(Color::White),
        _ => None,
    }
}

/// The accessors list rendering needs from an entry: a display title, a
/// secondary description line, and the text the filter matches against.
pub trait ListEntry {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn filter_value(&self) -> &str;
}

pub struct StoryItem {
    hit: Hit,
    label: String,
}

impl StoryItem {
    fn new(hit: Hit) -> Self {
        let label = hit.list_label();
        Self { hit, label }
    }

    pub fn hit(&self) -> &Hit {
        &self.hit
    }
}

impl ListEntry for StoryItem {
    fn title(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        &self.hit.url
    }

    fn filter_value(&self) -> &str {
        &self.hit.title
    }
}

/// The selectable story list. Response order is preserved; the filter
/// narrows the visible set without reordering it.
#[derive(Default)]
pub struct StoryList {
    items: Vec<StoryItem>,
    visible: Vec<usize>,
    state: ListState,
    filter: String,
}

impl StoryList {
    /// Replaces the displayed items and puts the selection back on the
    /// first entry, or clears it when there is nothing to show.
    pub fn load(&mut self, hits: Vec<Hit>) {
        self.items = hits.into_iter().map(StoryItem::new).collect();
        self.filter.clear();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                needle.is_empty() || item.filter_value().to_lowercase().contains(&needle)
            })
            .map(|(index, _)| index)
            .collect();
        self.state
            .select(if self.visible.is_empty() { None } else { Some(0) });
    }

    pub fn selected(&self) -> Option<&StoryItem> {
        self.state
            .selected()
            .and_then(|pos| self.visible.get(pos))
            .and_then(|&index| self.items.get(index))
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = (self.visible.len() - 1) as isize;
        let current = self.state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, last) as usize;
        self.state.select(Some(next));
    }

    pub fn select_first(&mut self) {
        if !self.visible.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if let Some(last) = self.visible.len().checked_sub(1) {
            self.state.select(Some(last));
        }
    }

    pub fn push_filter(&mut self, ch: char) {
        self.filter.push(ch);
        self.apply_filter();
    }

    pub fn pop_filter(&mut self) {
        self.filter.pop();
        self.apply_filter();
    }

    pub fn clear_filter(&mut self) {
        if !self.filter.is_empty() {
            self.filter.clear();
            self.apply_filter();
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    fn rows(&self) -> impl Iterator<Item = &StoryItem> {
        self.visible.iter().filter_map(move |&index| self.items.get(index))
    }

    fn state_mut(&mut self) -> &mut ListState {
        &mut self.state
    }
}

/// Scrollable view of one story's long-form text. The source is retained
/// so a resize can re-wrap the content.
#[derive(Default)]
pub struct Reader {
    source: String,
    content: Text<'static>,
    scroll: u16,
    height: u16,
}

impl Reader {
    /// Renders `text` at `width` columns and resets the scroll to the top.
    pub fn show(&mut self, text: &str, width: u16) {
        self.source = text.to_string();
        self.content = markdown::render_or_raw(text, width as usize);
        self.scroll = 0;
    }

    /// Re-wraps the current story after a resize.
    pub fn rewrap(&mut self, width: u16) {
        if self.source.is_empty() {
            return;
        }
        self.content = markdown::render_or_raw(&self.source, width as usize);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(self.max_scroll()));
        self.scroll = next as u16;
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.height = height;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn max_scroll(&self) -> u16 {
        (self.content.lines.len() as u16).saturating_sub(self.height.max(1))
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    fn content(&self) -> &Text<'static> {
        &self.content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Browsing,
    Reading,
}

pub struct Options {
    pub title: String,
    pub status_message: String,
    pub stories: Vec<Hit>,
    pub launcher: Box<dyn Launcher>,
    pub theme: Theme,
}

/// The interactive session. One mode is active at a time; input events
/// are routed to the story list or the reader accordingly.
pub struct Model {
    title: String,
    stories: StoryList,
    reader: Reader,
    mode: Mode,
    filtering: bool,
    launcher: Box<dyn Launcher>,
    theme: Theme,
    status_message: String,
    viewport: (u16, u16),
    needs_redraw: bool,
}

impl Model {
    pub fn new(options: Options) -> Self {
        let mut stories = StoryList::default();
        stories.load(options.stories);
        Self {
            title: options.title,
            stories,
            reader: Reader::default(),
            mode: Mode::Browsing,
            filtering: false,
            launcher: options.launcher,
            theme: options.theme,
            status_message: options.status_message,
            viewport: (0, 0),
            needs_redraw: true,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn selected_story(&self) -> Option<&Hit> {
        self.stories.selected().map(StoryItem::hit)
    }

    pub fn stories(&self) -> &StoryList {
        &self.stories
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let size = terminal.size()?;
        self.handle_resize(size.width, size.height);

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            if event::poll(Duration::from_millis(120))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key(key.code, key.modifiers)? {
                            break;
                        }
                    }
                    Event::Resize(width, height) => self.handle_resize(width, height),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    /// Recomputes pane dimensions; an open reader is re-wrapped in place.
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
        self.reader.set_viewport_height(self.reader_height());
        self.reader.rewrap(self.reader_width());
        self.mark_dirty();
    }

    // Inner area of the bordered reader pane.
    fn reader_width(&self) -> u16 {
        self.viewport.0.saturating_sub(4)
    }

    fn reader_height(&self) -> u16 {
        self.viewport.1.saturating_sub(3)
    }

    fn page_step(&self) -> isize {
        // List rows are two lines tall inside the bordered pane.
        ((self.viewport.1.saturating_sub(3) / 2) as isize).max(1)
    }

    /// Returns `Ok(true)` when the session should end.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(true);
        }

        if self.filtering {
            return self.handle_filter_key(code);
        }

        match self.mode {
            Mode::Browsing => self.handle_browsing_key(code),
            Mode::Reading => self.handle_reading_key(code),
        }
    }

    fn handle_filter_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Esc => {
                self.filtering = false;
                self.stories.clear_filter();
            }
            KeyCode::Enter => self.filtering = false,
            KeyCode::Backspace => self.stories.pop_filter(),
            KeyCode::Up => self.stories.move_by(-1),
            KeyCode::Down => self.stories.move_by(1),
            KeyCode::Char(ch) => self.stories.push_filter(ch),
            _ => {}
        }
        self.mark_dirty();
        Ok(false)
    }

    fn handle_browsing_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Char('/') => {
                self.filtering = true;
                self.stories.clear_filter();
            }
            KeyCode::Up | KeyCode::Char('k') => self.stories.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.stories.move_by(1),
            KeyCode::PageUp => self.stories.move_by(-self.page_step()),
            KeyCode::PageDown => self.stories.move_by(self.page_step()),
            KeyCode::Home | KeyCode::Char('g') => self.stories.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.stories.select_last(),
            _ => {}
        }
        self.mark_dirty();
        Ok(false)
    }

    fn handle_reading_key(&mut self, code: KeyCode) -> Result<bool> {
        let page = i32::from(self.reader_height().max(1));
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Backspace => self.mode = Mode::Browsing,
            KeyCode::Up | KeyCode::Char('k') => self.reader.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.reader.scroll_by(1),
            KeyCode::PageUp => self.reader.scroll_by(-page),
            KeyCode::PageDown | KeyCode::Char(' ') => self.reader.scroll_by(page),
            KeyCode::Home | KeyCode::Char('g') => self.reader.scroll_by(-i32::from(u16::MAX)),
            KeyCode::End | KeyCode::Char('G') => self.reader.scroll_by(i32::from(u16::MAX)),
            _ => {}
        }
        self.mark_dirty();
        Ok(false)
    }

    /// Enter on a story: linked stories go to the system browser, text
    /// stories open in the reader.
    fn activate_selected(&mut self) {
        let Some(hit) = self.stories.selected().map(|item| item.hit().clone()) else {
            return;
        };

        if hit.has_link() {
            match self.launcher.open(&hit.url) {
                Ok(()) => self.status_message = format!("Opened {}", hit.url),
                Err(err) => self.status_message = format!("Could not open link: {err}"),
            }
        } else if !hit.story_text.trim().is_empty() {
            self.reader.show(&hit.story_text, self.reader_width());
            self.reader.set_viewport_height(self.reader_height());
            self.mode = Mode::Reading;
        } else {
            self.status_message = "Story has no link or text.".to_string();
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.size());

        match self.mode {
            Mode::Browsing => self.draw_list(frame, chunks[0]),
            Mode::Reading => self.draw_reader(frame, chunks[0]),
        }
        self.draw_status(frame, chunks[1]);
    }

    fn draw_list(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let title = if self.filtering || !self.stories.filter().is_empty() {
            format!(" {} — /{} ", self.title, self.stories.filter())
        } else {
            format!(" {} ", self.title)
        };

        let dim = Style::default().fg(self.theme.dim);
        let rows: Vec<ListItem> = self
            .stories
            .rows()
            .map(|item| {
                let description = if item.description().is_empty() {
                    "text story"
                } else {
                    item.description()
                };
                ListItem::new(vec![
                    Line::from(Span::raw(item.title().to_string())),
                    Line::from(Span::styled(format!("  {description}"), dim)),
                ])
            })
            .collect();

        let list = List::new(rows)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .title(title),
            )
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, self.stories.state_mut());
    }

    fn draw_reader(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let title = self
            .stories
            .selected()
            .map(|item| format!(" {} ", item.filter_value()))
            .unwrap_or_default();

        let paragraph = Paragraph::new(self.reader.content().clone())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .title(title),
            )
            .scroll((self.reader.scroll(), 0));

        frame.render_widget(paragraph, area);
    }

    fn draw_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let help = if self.filtering {
            "type to filter • enter keep • esc clear"
        } else {
            match self.mode {
                Mode::Browsing => "↑/↓ navigate • / filter • enter open • q quit",
                Mode::Reading => "↑/↓ scroll • enter back • q quit",
            }
        };

        let line = Line::from(vec![
            Span::styled(
                self.status_message.clone(),
                Style::default().fg(self.theme.accent),
            ),
            Span::raw("  "),
            Span::styled(help, Style::default().fg(self.theme.dim)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::LaunchError;
    use std::sync::{Arc, Mutex};

    struct RecordingLauncher {
        opened: Arc<Mutex<Vec<String>>>,
    }

    impl Launcher for RecordingLauncher {
        fn open(&self, url: &str) -> Result<(), LaunchError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct FailingLauncher;

    impl Launcher for FailingLauncher {
        fn open(&self, _url: &str) -> Result<(), LaunchError> {
            Err(LaunchError::Unsupported)
        }
    }

    fn hit(title: &str, url: &str, story_text: &str) -> Hit {
        Hit {
            title: title.to_string(),
            url: url.to_string(),
            points: 1,
            story_text: story_text.to_string(),
        }
    }

    fn model_with(hits: Vec<Hit>) -> (Model, Arc<Mutex<Vec<String>>>) {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let mut model = Model::new(Options {
            title: "Hacker News".to_string(),
            status_message: String::new(),
            stories: hits,
            launcher: Box::new(RecordingLauncher {
                opened: opened.clone(),
            }),
            theme: Theme::default(),
        });
        model.handle_resize(80, 24);
        (model, opened)
    }

    fn press(model: &mut Model, code: KeyCode) -> bool {
        model.handle_key(code, KeyModifiers::NONE).expect("handle key")
    }

    #[test]
    fn empty_list_is_safe_to_navigate() {
        let (mut model, _) = model_with(Vec::new());
        assert!(model.selected_story().is_none());

        for code in [
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::PageDown,
            KeyCode::End,
            KeyCode::Enter,
        ] {
            assert!(!press(&mut model, code));
        }

        assert_eq!(model.mode(), Mode::Browsing);
        assert!(model.selected_story().is_none());
    }

    #[test]
    fn load_selects_the_first_story() {
        let (model, _) = model_with(vec![
            hit("first", "http://example.com/1", ""),
            hit("second", "http://example.com/2", ""),
        ]);
        assert_eq!(model.selected_story().unwrap().title, "first");
    }

    #[test]
    fn navigation_clamps_to_bounds() {
        let (mut model, _) = model_with(vec![
            hit("first", "http://example.com/1", ""),
            hit("second", "http://example.com/2", ""),
        ]);

        press(&mut model, KeyCode::Up);
        assert_eq!(model.selected_story().unwrap().title, "first");

        press(&mut model, KeyCode::Down);
        press(&mut model, KeyCode::Down);
        press(&mut model, KeyCode::Down);
        assert_eq!(model.selected_story().unwrap().title, "second");
    }

    #[test]
    fn linked_story_opens_externally_and_stays_browsing() {
        let (mut model, opened) = model_with(vec![hit("linked", "http://example.com", "")]);

        press(&mut model, KeyCode::Enter);

        assert_eq!(model.mode(), Mode::Browsing);
        assert_eq!(opened.lock().unwrap().as_slice(), ["http://example.com"]);
        assert!(model.status_message().contains("Opened"));
    }

    #[test]
    fn text_story_enters_reading_and_back_preserves_selection() {
        let (mut model, opened) = model_with(vec![
            hit("linked", "http://example.com", ""),
            hit("text story", "", "Some *markdown* body."),
        ]);

        press(&mut model, KeyCode::Down);
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.mode(), Mode::Reading);
        assert!(opened.lock().unwrap().is_empty());

        press(&mut model, KeyCode::Enter);
        assert_eq!(model.mode(), Mode::Browsing);
        assert_eq!(model.selected_story().unwrap().title, "text story");
    }

    #[test]
    fn story_without_link_or_text_reports_status() {
        let (mut model, _) = model_with(vec![hit("bare", "", "")]);
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.mode(), Mode::Browsing);
        assert!(model.status_message().contains("no link or text"));
    }

    #[test]
    fn launch_failure_is_reported_without_changing_state() {
        let mut model = Model::new(Options {
            title: "Hacker News".to_string(),
            status_message: String::new(),
            stories: vec![hit("linked", "http://example.com", "")],
            launcher: Box::new(FailingLauncher),
            theme: Theme::default(),
        });
        model.handle_resize(80, 24);

        press(&mut model, KeyCode::Enter);

        assert_eq!(model.mode(), Mode::Browsing);
        assert!(model.status_message().contains("Could not open link"));
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let (mut model, _) = model_with(vec![hit("text story", "", "body")]);
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.mode(), Mode::Reading);
        assert!(model
            .handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL)
            .unwrap());
    }

    #[test]
    fn filter_narrows_by_title() {
        let (mut model, _) = model_with(vec![
            hit("Rust 1.0 released", "http://example.com/rust", ""),
            hit("Go ships generics", "http://example.com/go", ""),
        ]);

        press(&mut model, KeyCode::Char('/'));
        for ch in "rust".chars() {
            press(&mut model, KeyCode::Char(ch));
        }
        assert_eq!(model.stories().len(), 1);
        assert_eq!(model.selected_story().unwrap().title, "Rust 1.0 released");

        press(&mut model, KeyCode::Esc);
        assert_eq!(model.stories().len(), 2);
    }

    #[test]
    fn filter_with_no_matches_leaves_no_selection() {
        let (mut model, _) = model_with(vec![hit("only story", "http://example.com", "")]);

        press(&mut model, KeyCode::Char('/'));
        press(&mut model, KeyCode::Char('z'));
        assert!(model.selected_story().is_none());
        assert!(!press(&mut model, KeyCode::Down));

        press(&mut model, KeyCode::Backspace);
        assert!(model.selected_story().is_some());
    }

    #[test]
    fn reader_scroll_clamps_to_content() {
        let mut reader = Reader::default();
        let body: String = (0..50).map(|i| format!("line {i}\n\n")).collect();
        reader.show(&body, 40);
        reader.set_viewport_height(10);

        reader.scroll_by(10_000);
        let bottom = reader.scroll();
        assert!(bottom > 0);

        reader.scroll_by(5);
        assert_eq!(reader.scroll(), bottom);

        reader.scroll_by(-10_000);
        assert_eq!(reader.scroll(), 0);
    }

    #[test]
    fn resize_rewraps_the_open_reader() {
        let (mut model, _) = model_with(vec![hit(
            "text story",
            "",
            "a paragraph long enough that wrapping at different widths changes the line count",
        )]);
        press(&mut model, KeyCode::Enter);
        assert_eq!(model.mode(), Mode::Reading);

        let wide = model.reader.content().lines.len();
        model.handle_resize(30, 24);
        let narrow = model.reader.content().lines.len();
        assert!(narrow > wide);
    }
}
