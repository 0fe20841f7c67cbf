use crate::util::{EntryKind, get_clipboard, get_files};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Clear, Paragraph, Row, Table, Widget},
};
use std::path::{Path, PathBuf};
use tui_input::{Input, InputRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    Stay,
    Close,
    Picked(PathBuf),
}

/// Directory browser used in place of a native file dialog
#[derive(Debug)]
pub struct FilePicker {
    dir: PathBuf,
    items: Vec<(String, EntryKind)>,
    selected: usize,
    typing: bool,
    input: Input,
    error: Option<String>,
}

impl FilePicker {
    pub fn open(dir: &Path) -> Self {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let items = get_files(&dir);
        Self {
            dir,
            items,
            selected: 0,
            typing: false,
            input: Input::default(),
            error: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn items(&self) -> &[(String, EntryKind)] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerAction {
        self.error = None;
        if self.typing {
            return self.handle_typed_path(key);
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => PickerAction::Close,
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.items.is_empty() {
                    self.selected = (self.selected + 1) % self.items.len();
                }
                PickerAction::Stay
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let count = self.items.len();
                if count > 0 {
                    self.selected = (self.selected + count - 1) % count;
                }
                PickerAction::Stay
            }
            KeyCode::Char('/') => {
                self.typing = true;
                self.input = Input::new(format!("{}/", self.dir.display()));
                PickerAction::Stay
            }
            KeyCode::Char('p') => match get_clipboard() {
                Some(text) => self.pick_path(PathBuf::from(text.trim())),
                None => {
                    self.error = Some("Clipboard is empty".into());
                    PickerAction::Stay
                }
            },
            KeyCode::Enter => self.activate(),
            _ => PickerAction::Stay,
        }
    }

    fn handle_typed_path(&mut self, key: KeyEvent) -> PickerAction {
        match key.code {
            KeyCode::Esc => {
                self.typing = false;
                PickerAction::Stay
            }
            KeyCode::Enter => {
                self.typing = false;
                let typed = PathBuf::from(self.input.value().trim());
                self.pick_path(typed)
            }
            code => {
                if let Some(request) = input_request(code) {
                    self.input.handle(request);
                }
                PickerAction::Stay
            }
        }
    }

    fn activate(&mut self) -> PickerAction {
        let Some((name, kind)) = self.items.get(self.selected).cloned() else {
            return PickerAction::Stay;
        };
        match (name.as_str(), kind) {
            (".", _) => PickerAction::Stay,
            ("..", _) => {
                if let Some(parent) = self.dir.parent().map(Path::to_path_buf) {
                    self.enter(parent);
                }
                PickerAction::Stay
            }
            _ => self.pick_path(self.dir.join(name)),
        }
    }

    // Directories are entered, anything else is picked as-is
    fn pick_path(&mut self, path: PathBuf) -> PickerAction {
        if path.is_dir() {
            self.enter(path);
            PickerAction::Stay
        } else if path.exists() {
            PickerAction::Picked(path)
        } else {
            self.error = Some(format!("No such file: {}", path.display()));
            PickerAction::Stay
        }
    }

    fn enter(&mut self, dir: PathBuf) {
        self.items = get_files(&dir);
        self.dir = dir;
        self.selected = 0;
    }
}

// Editing keys for the typed path field
fn input_request(code: KeyCode) -> Option<InputRequest> {
    match code {
        KeyCode::Char(c) => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

impl Widget for &FilePicker {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::bordered()
            .title(Line::from(format!(" {} ", self.dir.display())).bold())
            .border_set(border::THICK)
            .style(Style::default().bg(Color::Black).fg(Color::White))
            .title_bottom(
                Line::from(" <Enter> pick | </> type path | <p> paste | <Esc> close ")
                    .alignment(Alignment::Center),
            );
        let inner = block.inner(area);
        block.render(area, buf);

        let [list_area, footer] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        // Keep the selection visible
        let height = list_area.height as usize;
        let start = if height > 0 && self.selected >= height {
            self.selected + 1 - height
        } else {
            0
        };
        let end = (start + height).min(self.items.len());

        let rows = self.items[start..end]
            .iter()
            .enumerate()
            .map(|(i, (name, kind))| {
                let row = Row::new(vec![name.clone(), kind.label().to_string()]);
                if start + i == self.selected {
                    row.style(Style::default().bg(Color::LightBlue).fg(Color::DarkGray).bold())
                } else {
                    row
                }
            });

        Table::new(rows, [Constraint::Percentage(80), Constraint::Percentage(20)])
            .column_spacing(1)
            .render(list_area, buf);

        let footer_line = if self.typing {
            Line::from(format!("Path: {}", self.input.value())).yellow()
        } else if let Some(err) = &self.error {
            Line::from(err.as_str()).red()
        } else {
            Line::from("")
        };
        Paragraph::new(footer_line).render(footer, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_pick_file_and_walk_directories() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("input")).unwrap();
        std::fs::write(root.path().join("input").join("data.xlsx"), b"x").unwrap();

        let mut picker = FilePicker::open(root.path());
        // ".", "..", "input"
        picker.handle_key(key(KeyCode::Char('j')));
        picker.handle_key(key(KeyCode::Char('j')));
        assert_eq!(picker.handle_key(key(KeyCode::Enter)), PickerAction::Stay);
        assert!(picker.dir().ends_with("input"));

        picker.handle_key(key(KeyCode::Char('k')));
        match picker.handle_key(key(KeyCode::Enter)) {
            PickerAction::Picked(path) => assert!(path.ends_with("data.xlsx")),
            other => panic!("expected a pick, got {other:?}"),
        }
    }

    #[test]
    fn test_typed_path() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("report.xlsx");
        std::fs::write(&target, b"x").unwrap();

        let mut picker = FilePicker::open(root.path());
        picker.handle_key(key(KeyCode::Char('/')));
        for c in "report.xlsx".chars() {
            picker.handle_key(key(KeyCode::Char(c)));
        }
        match picker.handle_key(key(KeyCode::Enter)) {
            PickerAction::Picked(path) => assert!(path.ends_with("report.xlsx")),
            other => panic!("expected a pick, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_typed_path_stays_open() {
        let root = tempfile::tempdir().unwrap();
        let mut picker = FilePicker::open(root.path());
        picker.handle_key(key(KeyCode::Char('/')));
        picker.handle_key(key(KeyCode::Char('x')));
        assert_eq!(picker.handle_key(key(KeyCode::Enter)), PickerAction::Stay);
        assert_eq!(picker.handle_key(key(KeyCode::Esc)), PickerAction::Close);
    }

    #[test]
    fn test_typed_path_editing_keys() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("report.xlsx");
        std::fs::write(&target, b"x").unwrap();

        let mut picker = FilePicker::open(root.path());
        picker.handle_key(key(KeyCode::Char('/')));
        // "reprt.xlsxz", then fix it up
        for c in "reprt.xlsxz".chars() {
            picker.handle_key(key(KeyCode::Char(c)));
        }
        picker.handle_key(key(KeyCode::Backspace));
        for _ in 0..7 {
            picker.handle_key(key(KeyCode::Left));
        }
        picker.handle_key(key(KeyCode::Char('o')));
        picker.handle_key(key(KeyCode::End));
        picker.handle_key(key(KeyCode::Tab));

        match picker.handle_key(key(KeyCode::Enter)) {
            PickerAction::Picked(path) => assert!(path.ends_with("report.xlsx")),
            other => panic!("expected a pick, got {other:?}"),
        }
    }
}
