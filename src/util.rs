/// Collection of small utilities used all over the place
use chrono::{DateTime, Local};
use clipboard_rs::{self, Clipboard};
use humantime::format_duration;
use std::{fs, path::Path, time::Duration};

pub fn format_timestamp(ts: DateTime<Local>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

// Millisecond precision is plenty for a request
pub fn format_elapsed(elapsed: Duration) -> String {
    let trimmed = Duration::from_millis(elapsed.as_millis() as u64);
    format_duration(trimmed).to_string()
}

// Get text from clipboard
pub fn get_clipboard() -> Option<String> {
    let ctx = clipboard_rs::ClipboardContext::new().ok()?;
    ctx.get_text().ok().filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Dir,
    File,
    Symlink,
    Unknown,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Dir => "Dir",
            EntryKind::File => "File",
            EntryKind::Symlink => "Symlink",
            EntryKind::Unknown => "Unknown",
        }
    }
}

pub fn get_files(dir: &Path) -> Vec<(String, EntryKind)> {
    let mut items = vec![];

    // Manually add "." and ".."
    items.push((".".to_string(), EntryKind::Dir));
    items.push(("..".to_string(), EntryKind::Dir));

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let file_name = entry
                .file_name()
                .into_string()
                .unwrap_or_else(|_| "???".to_string());

            let kind = match entry.file_type() {
                Ok(ft) if ft.is_dir() => EntryKind::Dir,
                Ok(ft) if ft.is_file() => EntryKind::File,
                Ok(ft) if ft.is_symlink() => EntryKind::Symlink,
                _ => EntryKind::Unknown,
            };

            items.push((file_name, kind));
        }
    }

    items.sort_by(|a, b| {
        match (a.0.as_str(), b.0.as_str()) {
            // "." and ".." always go first
            ("." | "..", "." | "..") => a.0.cmp(&b.0),
            ("." | "..", _) => std::cmp::Ordering::Less,
            (_, "." | "..") => std::cmp::Ordering::Greater,
            // Directories before files, then by name
            _ if a.1 == b.1 => a.0.to_lowercase().cmp(&b.0.to_lowercase()),
            _ if a.1 == EntryKind::Dir => std::cmp::Ordering::Less,
            _ if b.1 == EntryKind::Dir => std::cmp::Ordering::Greater,
            _ => std::cmp::Ordering::Equal,
        }
    });

    items
}
