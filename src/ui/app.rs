use crate::api::ProcessClient;
use crate::dropdown::{ClickTarget, MonthDropdown, classify_click};
use crate::ui::picker::{FilePicker, PickerAction};
use crate::ui::{centered_rect, list_offset, option_at, screen_layout};
use crate::util::{format_bytes, format_elapsed, format_timestamp};
use crate::workflow::{self, DownloadSink, Outcome};
use chrono::{DateTime, Local};
use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use futures::StreamExt;
use ratatui::{
    DefaultTerminal, Frame,
    buffer::Buffer,
    layout::{Alignment, Position, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{
        Block, Clear, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap,
    },
};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Work the event loop has to await
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenFile {
    pub path: PathBuf,
    pub size: u64,
}

impl ChosenFile {
    pub fn new(path: PathBuf) -> Self {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self { path, size }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Saved(PathBuf),
    Rejected(u16),
}

/// Last visible result. Transport failures never produce one, they only go to the log.
#[derive(Debug, Clone)]
pub struct Status {
    pub kind: StatusKind,
    pub at: DateTime<Local>,
    pub elapsed: Duration,
}

impl Status {
    pub fn from_outcome(outcome: Outcome, at: DateTime<Local>, elapsed: Duration) -> Option<Self> {
        let kind = match outcome {
            Outcome::Downloaded(path) => StatusKind::Saved(path),
            Outcome::Rejected { status, .. } => StatusKind::Rejected(status),
            Outcome::Failed(_) => return None,
        };
        Some(Self { kind, at, elapsed })
    }

    pub fn line(&self) -> String {
        let at = format_timestamp(self.at);
        match &self.kind {
            StatusKind::Saved(path) => format!(
                "Saved {} at {} ({})",
                path.display(),
                at,
                format_elapsed(self.elapsed)
            ),
            StatusKind::Rejected(status) => {
                format!("Rejected by server (HTTP {}) at {}", status, at)
            }
        }
    }
}

#[derive(Debug)]
pub struct App {
    should_exit: bool,
    show_help: bool,
    loading: bool,
    area: Rect,
    dropdown: MonthDropdown,
    upload: Option<ChosenFile>,
    picker: Option<FilePicker>,
    notifications: VecDeque<String>,
    status: Option<Status>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        let mut dropdown = MonthDropdown::default();
        dropdown.on_change(|selection| tracing::debug!(selection, "month selection changed"));

        Self {
            should_exit: false,
            show_help: false,
            loading: false,
            area: Rect::default(),
            dropdown,
            upload: None,
            picker: None,
            notifications: VecDeque::new(),
            status: None,
        }
    }

    pub fn dropdown(&self) -> &MonthDropdown {
        &self.dropdown
    }

    pub fn upload(&self) -> Option<&ChosenFile> {
        self.upload.as_ref()
    }

    pub fn set_upload(&mut self, path: PathBuf) {
        tracing::info!(path = %path.display(), "upload file chosen");
        self.upload = Some(ChosenFile::new(path));
    }

    pub fn notifications(&self) -> &VecDeque<String> {
        &self.notifications
    }

    pub fn picker(&self) -> Option<&FilePicker> {
        self.picker.as_ref()
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    // Mouse hit-testing uses the area of the last frame
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    // Main app logic
    pub async fn run(
        &mut self,
        terminal: &mut DefaultTerminal,
        client: &ProcessClient,
        sink: &mut dyn DownloadSink,
    ) -> io::Result<()> {
        let mut events = EventStream::new();
        self.redraw(terminal)?;

        while !self.should_exit {
            let Some(event) = events.next().await else {
                break;
            };

            let action = match event? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
                Event::Mouse(mouse) => self.handle_mouse_event(mouse),
                _ => None,
            };

            if let Some(Action::Generate) = action {
                self.loading = true;
                self.redraw(terminal)?;
                self.generate(client, sink).await;
                self.loading = false;
            }

            // Always redraw after handling an event
            self.redraw(terminal)?;
        }

        Ok(())
    }

    fn redraw(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        let completed = terminal.draw(|f| self.draw(f))?;
        self.area = completed.area;
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }

    /// One pass of the upload workflow with the current selection and file
    pub async fn generate(&mut self, client: &ProcessClient, sink: &mut dyn DownloadSink) {
        let started = Instant::now();
        let outcome = workflow::generate(
            client,
            self.dropdown.selection(),
            self.upload.as_ref().map(|f| f.path.as_path()),
            &mut self.notifications,
            sink,
        )
        .await;

        // A failed request keeps whatever was shown before
        if let Some(status) = Status::from_outcome(outcome, Local::now(), started.elapsed()) {
            self.status = Some(status);
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        // A notification blocks everything until it's acknowledged
        if !self.notifications.is_empty() {
            if matches!(
                key.code,
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char(' ')
            ) {
                self.notifications.pop_front();
            }
            return None;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return None;
        }

        if let Some(picker) = self.picker.as_mut() {
            match picker.handle_key(key) {
                PickerAction::Stay => {}
                PickerAction::Close => self.picker = None,
                PickerAction::Picked(path) => {
                    self.picker = None;
                    self.set_upload(path);
                }
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') => self.exit(),
            KeyCode::Char('m') => self.dropdown.handle_click(ClickTarget::Label),
            // Same as clicking somewhere else
            KeyCode::Esc => self.dropdown.handle_click(ClickTarget::Outside),
            KeyCode::Char('j') | KeyCode::Down if self.dropdown.is_open() => self.dropdown.next(),
            KeyCode::Char('k') | KeyCode::Up if self.dropdown.is_open() => {
                self.dropdown.previous()
            }
            KeyCode::Char(' ') | KeyCode::Enter if self.dropdown.is_open() => {
                self.dropdown.toggle_at_cursor()
            }
            KeyCode::Char('f') => self.open_picker(),
            KeyCode::Char('g') => return Some(Action::Generate),
            KeyCode::Char('?') => self.show_help = true,
            // Drop every other keypresses
            _ => {}
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Option<Action> {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }
        if !self.notifications.is_empty() {
            self.notifications.pop_front();
            return None;
        }
        if self.show_help || self.picker.is_some() {
            return None;
        }

        let point = Position::new(mouse.column, mouse.row);
        let layout = screen_layout(self.area, self.dropdown.options().len());
        let list = self.dropdown.is_open().then_some(layout.list);
        let target = classify_click(point, layout.label, list);

        if target == ClickTarget::List {
            let offset = list_offset(layout.list, self.dropdown.cursor());
            if let Some(index) = option_at(layout.list, point, offset) {
                self.dropdown.toggle_option(index);
            }
        }
        self.dropdown.handle_click(target);

        if target == ClickTarget::Outside {
            if layout.upload.contains(point) {
                self.open_picker();
            } else if layout.generate.contains(point) {
                return Some(Action::Generate);
            }
        }
        None
    }

    fn open_picker(&mut self) {
        let start = self
            .upload
            .as_ref()
            .and_then(|f| f.path.parent().map(Path::to_path_buf))
            .filter(|p| p.is_dir())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        self.picker = Some(FilePicker::open(&start));
    }

    fn exit(&mut self) {
        self.should_exit = true;
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = screen_layout(area, self.dropdown.options().len());

        let title_text = if self.loading {
            " Monthly Revenue Report - [Generating...] ".bold().blue()
        } else {
            " Monthly Revenue Report ".bold().blue()
        };
        let instructions = Line::from(
            " Months: <m> | Upload: <f> | Generate: <g> | Help: <?> | Quit: <q> "
                .bold()
                .yellow(),
        );
        Block::bordered()
            .title(Line::from(title_text))
            .title_bottom(instructions.centered())
            .border_set(border::ROUNDED)
            .render(area, buf);

        // Dropdown label; an open indicator climbs onto the bottom border
        let indicator = self.dropdown.indicator();
        let mut label_block = Block::bordered()
            .title(" Months ")
            .border_set(border::ROUNDED);
        let label_text = if indicator.margin_top() < 0 {
            label_block = label_block.title_bottom(Line::from(indicator.glyph()).right_aligned());
            Line::from(self.dropdown.label())
        } else {
            Line::from(vec![
                Span::raw(self.dropdown.label()),
                Span::raw(" "),
                Span::raw(indicator.glyph()),
            ])
        };
        let label_style = if self.dropdown.selection().is_empty() {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::White)
        };
        Paragraph::new(label_text)
            .style(label_style)
            .block(label_block)
            .render(layout.label, buf);

        // Upload control
        let upload_line = match &self.upload {
            Some(file) => Line::from(format!("{} ({})", file.name(), format_bytes(file.size))),
            None => Line::from("No file chosen").gray(),
        };
        Paragraph::new(upload_line)
            .block(
                Block::bordered()
                    .title(" Upload ")
                    .title_bottom(Line::from(" <f> choose file ").right_aligned())
                    .border_set(border::ROUNDED),
            )
            .render(layout.upload, buf);

        // Generate button
        Paragraph::new(Line::from(" Generate ".bold()))
            .alignment(Alignment::Center)
            .block(Block::bordered().border_set(border::THICK))
            .style(Style::default().fg(Color::Yellow))
            .render(layout.generate, buf);

        if let Some(status) = &self.status {
            let style = match status.kind {
                StatusKind::Saved(_) => Style::default().fg(Color::Green),
                StatusKind::Rejected(_) => Style::default().fg(Color::Red),
            };
            Paragraph::new(status.line())
                .style(style)
                .render(layout.status, buf);
        }

        // Option list, drawn over whatever sits below the label
        if self.dropdown.is_open() {
            Clear.render(layout.list, buf);
            let items = self
                .dropdown
                .options()
                .iter()
                .map(|option| {
                    let mark = if option.checked { "[x]" } else { "[ ]" };
                    ListItem::new(format!("{} {}", mark, option.value))
                })
                .collect::<Vec<_>>();

            // Scroll so the cursor row is always drawn
            let cursor = self.dropdown.cursor();
            let mut state = ListState::default()
                .with_offset(list_offset(layout.list, cursor))
                .with_selected(Some(cursor));
            let list = List::new(items)
                .block(Block::bordered().border_set(border::ROUNDED))
                .highlight_style(Style::default().bg(Color::LightBlue).fg(Color::DarkGray));
            StatefulWidget::render(list, layout.list, buf, &mut state);
        }

        if let Some(picker) = &self.picker {
            picker.render(centered_rect(70, 70, area), buf);
        }

        // Help popup
        if self.show_help {
            let popup_area = centered_rect(60, 60, area);
            let help_text = Text::from(vec![
                Line::from(" Shortcuts:"),
                Line::from(""),
                Line::from("  m     - Open/close the month list"),
                Line::from("  j/k   - Move inside the month list"),
                Line::from("  space - Check/uncheck the month under the cursor"),
                Line::from("  Esc   - Close the month list"),
                Line::from("  f     - Choose the file to upload"),
                Line::from("  g     - Upload and download Result.xlsx"),
                Line::from("  q     - Quit (or close this help)"),
                Line::from("  ?     - Show this help"),
                Line::from(""),
                Line::from(" The mouse works too: click the label, the months or the buttons."),
            ]);

            let help_block = Block::bordered()
                .title(Line::from(" Help ".bold()))
                .border_set(border::THICK)
                .style(Style::default().bg(Color::Black).fg(Color::White))
                .title_bottom(
                    Line::from(" Close this panel with <q> ").alignment(Alignment::Center),
                );

            Clear.render(popup_area, buf);
            Paragraph::new(help_text)
                .block(help_block)
                .wrap(Wrap { trim: false })
                .render(popup_area, buf);
        }

        // Notification popup, one at a time
        if let Some(msg) = self.notifications.front() {
            let popup_area = centered_rect(60, 30, area);
            let block = Block::bordered()
                .title(" Notice ".bold())
                .border_set(border::THICK)
                .style(Style::default().bg(Color::Black).fg(Color::White))
                .title_bottom(Line::from(" OK: <Enter> ").alignment(Alignment::Center));
            Clear.render(popup_area, buf);
            Paragraph::new(msg.as_str())
                .block(block)
                .wrap(Wrap { trim: true })
                .render(popup_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropdown::{MONTHS, PLACEHOLDER};
    use crate::workflow::Artifact;
    use crossterm::event::KeyModifiers;

    #[derive(Default)]
    struct MemorySink {
        delivered: Vec<Artifact>,
    }

    impl DownloadSink for MemorySink {
        fn deliver(&mut self, artifact: Artifact) -> io::Result<PathBuf> {
            let path = PathBuf::from(&artifact.file_name);
            self.delivered.push(artifact);
            Ok(path)
        }
    }

    // Nothing listens on the returned address
    fn closed_port_client() -> ProcessClient {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        ProcessClient::new(&format!("http://{addr}"))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_keyboard_selection() {
        let mut app = App::new();
        app.handle_key_event(key(KeyCode::Char('m')));
        assert!(app.dropdown().is_open());

        app.handle_key_event(key(KeyCode::Char(' ')));
        app.handle_key_event(key(KeyCode::Char('j')));
        app.handle_key_event(key(KeyCode::Char('j')));
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.dropdown().label(), "January, March");

        app.handle_key_event(key(KeyCode::Esc));
        assert!(!app.dropdown().is_open());
        // Esc again doesn't re-open
        app.handle_key_event(key(KeyCode::Esc));
        assert!(!app.dropdown().is_open());
    }

    #[test]
    fn test_generate_key_returns_action() {
        let mut app = App::new();
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('g'))),
            Some(Action::Generate)
        );
    }

    #[test]
    fn test_mouse_label_toggles_and_outside_closes() {
        let mut app = App::new();
        let area = Rect::new(0, 0, 100, 40);
        app.set_area(area);
        let layout = screen_layout(area, 12);

        app.handle_mouse_event(click(layout.label.x + 2, layout.label.y + 1));
        assert!(app.dropdown().is_open());

        // Second option row
        app.handle_mouse_event(click(layout.list.x + 2, layout.list.y + 2));
        assert!(app.dropdown().is_open());
        assert_eq!(app.dropdown().selection(), "February");

        app.handle_mouse_event(click(0, 0));
        assert!(!app.dropdown().is_open());
        app.handle_mouse_event(click(0, 0));
        assert!(!app.dropdown().is_open());
    }

    #[test]
    fn test_generate_button_click() {
        let mut app = App::new();
        let area = Rect::new(0, 0, 100, 40);
        app.set_area(area);
        let layout = screen_layout(area, 12);

        let action = app.handle_mouse_event(click(layout.generate.x + 3, layout.generate.y + 1));
        assert_eq!(action, Some(Action::Generate));
    }

    #[test]
    fn test_notifications_block_until_dismissed() {
        let mut app = App::new();
        app.notifications.push_back("first".into());
        app.notifications.push_back("second".into());

        // Swallowed while a notice is up
        assert_eq!(app.handle_key_event(key(KeyCode::Char('g'))), None);
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.notifications().front().map(String::as_str), Some("second"));
        app.handle_mouse_event(click(1, 1));
        assert!(app.notifications().is_empty());
    }

    #[test]
    fn test_render_shows_placeholder_and_glyphs() {
        let mut app = App::new();
        let area = Rect::new(0, 0, 100, 40);
        let mut buf = Buffer::empty(area);

        (&app).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains(PLACEHOLDER));
        assert!(text.contains("No file chosen"));
        assert!(!text.contains("[ ] January"));

        app.handle_key_event(key(KeyCode::Char('m')));
        app.handle_key_event(key(KeyCode::Char(' ')));
        let mut buf = Buffer::empty(area);
        (&app).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("[x] January"));
        assert!(text.contains("[ ] December"));
    }

    #[test]
    fn test_quit() {
        let mut app = App::new();
        app.handle_key_event(key(KeyCode::Char('q')));
        assert!(app.should_exit());
    }

    #[tokio::test]
    async fn test_refused_connection_shows_nothing() {
        let mut app = App::new();
        let client = closed_port_client();
        let mut sink = MemorySink::default();

        app.generate(&client, &mut sink).await;

        assert!(app.notifications().is_empty());
        assert!(app.status().is_none());
        assert!(sink.delivered.is_empty());

        let area = Rect::new(0, 0, 100, 40);
        let mut buf = Buffer::empty(area);
        (&app).render(area, &mut buf);
        let text = buffer_text(&buf).to_lowercase();
        assert!(!text.contains("failed"));
        assert!(!text.contains("error"));
    }

    #[tokio::test]
    async fn test_refused_connection_keeps_previous_status() {
        let mut app = App::new();
        app.status = Status::from_outcome(
            Outcome::Rejected {
                status: 404,
                message: "bad file".into(),
            },
            Local::now(),
            Duration::from_millis(10),
        );
        let client = closed_port_client();
        let mut sink = MemorySink::default();

        app.generate(&client, &mut sink).await;

        assert_eq!(
            app.status().map(|s| s.kind.clone()),
            Some(StatusKind::Rejected(404))
        );
    }

    #[test]
    fn test_cursor_row_visible_on_short_terminal() {
        let mut app = App::new();
        app.handle_key_event(key(KeyCode::Char('m')));
        for _ in 0..11 {
            app.handle_key_event(key(KeyCode::Char('j')));
        }
        app.handle_key_event(key(KeyCode::Char(' ')));
        assert_eq!(app.dropdown().cursor(), 11);
        assert_eq!(app.dropdown().label(), "December");

        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        (&app).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("[x] December"));
        assert!(!text.contains("[ ] January"));
    }

    #[test]
    fn test_click_on_scrolled_list_hits_visible_row() {
        let mut app = App::new();
        let area = Rect::new(0, 0, 60, 12);
        app.set_area(area);
        app.handle_key_event(key(KeyCode::Char('m')));
        for _ in 0..11 {
            app.handle_key_event(key(KeyCode::Char('j')));
        }

        let layout = screen_layout(area, 12);
        let offset = list_offset(layout.list, 11);
        assert!(offset > 0);
        // Top drawn row
        app.handle_mouse_event(click(layout.list.x + 2, layout.list.y + 1));
        assert_eq!(app.dropdown().selection(), MONTHS[offset]);
    }
}
