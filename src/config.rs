use crate::ui::centered_rect;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Stdout},
    path::{Path, PathBuf},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_url: String,
    pub port: u16,
    pub download_dir: PathBuf,
}

impl AppConfig {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir() // Use the OS agnostic config dir on all systems
            .unwrap_or_else(|| PathBuf::from("."))
            .join("revtui")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn default_download_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.server_url, self.port)
    }

    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, body)
    }
}

// Run a small Ratatui-based form to collect URL, port and download folder.
// Returns None when the user aborts with <Esc>.
pub fn run_config_wizard(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> io::Result<Option<AppConfig>> {
    use crossterm::event::{self, Event, KeyCode};

    let labels = [" Server URL ", " Port ", " Download folder (empty = default) "];
    let mut inputs = [String::new(), String::new(), String::new()];
    let mut active = 0;
    let mut error_msg: Option<String> = None;

    terminal.show_cursor()?;

    loop {
        terminal.draw(|f| {
            // Centered dialog area
            let area = centered_rect(60, 60, f.area());

            let dialog = Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " Report Generator Setup ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .style(Style::default().bg(Color::Black).fg(Color::White));
            f.render_widget(dialog, area);

            // 3 fields + footer
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .margin(1)
                .constraints([
                    Constraint::Length(3), // Server URL
                    Constraint::Length(3), // Port
                    Constraint::Length(3), // Download folder
                    Constraint::Length(3), // Instructions
                ])
                .split(area);

            for (i, label) in labels.iter().enumerate() {
                let is_active = i == active;

                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(if is_active {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default()
                    })
                    .title(Span::styled(
                        *label,
                        if is_active {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        },
                    ));

                let paragraph = Paragraph::new(inputs[i].as_str())
                    .style(if is_active {
                        Style::default().fg(Color::White)
                    } else {
                        Style::default().fg(Color::Gray)
                    })
                    .block(block);

                f.render_widget(paragraph, rows[i]);
            }

            let input_rect = rows[active];
            f.set_cursor_position((
                input_rect.x + 1 + inputs[active].chars().count() as u16,
                input_rect.y + 1,
            ));

            // Footer: either error or help
            let footer = if let Some(err) = &error_msg {
                Paragraph::new(Line::from(Span::styled(
                    err.clone(),
                    Style::default().fg(Color::White).bg(Color::Red),
                )))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .alignment(ratatui::layout::Alignment::Center)
            } else {
                Paragraph::new(Line::from(vec![
                    Span::raw("↑/↓: move  "),
                    Span::raw("Enter: next field  "),
                    Span::raw("Enter(last): OK  "),
                    Span::raw("Esc: quit"),
                ]))
                .style(Style::default().fg(Color::Gray))
                .alignment(ratatui::layout::Alignment::Center)
            };
            f.render_widget(footer, rows[3]);
        })?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char(c) => {
                    // Only digits in the port field
                    if active != 1 || c.is_ascii_digit() {
                        inputs[active].push(c);
                    }
                    error_msg = None;
                }
                KeyCode::Backspace => {
                    inputs[active].pop();
                    error_msg = None;
                }
                KeyCode::Up => {
                    active = active.saturating_sub(1);
                    error_msg = None;
                }
                KeyCode::Down => {
                    if active < labels.len() - 1 {
                        active += 1;
                    }
                    error_msg = None;
                }
                KeyCode::Enter => {
                    if active < labels.len() - 1 {
                        active += 1;
                        error_msg = None;
                        continue;
                    }
                    match validate_inputs(&inputs) {
                        Ok(cfg) => {
                            terminal.hide_cursor()?;
                            return Ok(Some(cfg));
                        }
                        Err(msg) => error_msg = Some(msg),
                    }
                }
                KeyCode::Esc => {
                    terminal.hide_cursor()?;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

fn validate_inputs(inputs: &[String; 3]) -> Result<AppConfig, String> {
    let server_url = inputs[0].trim().trim_end_matches('/').to_string();
    if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
        return Err("Server URL must start with http:// or https://".into());
    }

    let port = inputs[1]
        .parse::<u16>()
        .map_err(|_| "Port must be a number 0–65535".to_string())?;

    let download_dir = if inputs[2].trim().is_empty() {
        AppConfig::default_download_dir()
    } else {
        PathBuf::from(inputs[2].trim())
    };

    Ok(AppConfig {
        server_url,
        port,
        download_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_inputs() {
        let cfg = validate_inputs(&[
            "http://localhost/".into(),
            "5000".into(),
            "/tmp/out".into(),
        ])
        .unwrap();
        assert_eq!(cfg.server_url, "http://localhost");
        assert_eq!(cfg.base_url(), "http://localhost:5000");
        assert_eq!(cfg.download_dir, PathBuf::from("/tmp/out"));

        assert!(validate_inputs(&["localhost".into(), "5000".into(), "".into()]).is_err());
        assert!(validate_inputs(&["http://x".into(), "99999".into(), "".into()]).is_err());
    }
}
