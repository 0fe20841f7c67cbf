pub mod app;
pub mod picker;

use ratatui::layout::{Constraint, Layout, Margin, Position, Rect};

// Helper function for the popups

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    // raw size
    let raw_w = area.width.saturating_mul(percent_x) / 100;
    let raw_h = area.height.saturating_mul(percent_y) / 100;

    // enforce minimum of 3 (1 border + 1 content + 1 border)
    let w = raw_w.max(3).min(area.width);
    let h = raw_h.max(3).min(area.height);

    // center it in `area`
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;

    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Screen regions of the main view, shared by rendering and mouse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub label: Rect,
    pub list: Rect,
    pub upload: Rect,
    pub generate: Rect,
    pub status: Rect,
}

pub fn screen_layout(area: Rect, option_count: usize) -> ScreenLayout {
    let inner = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });

    let [_, column, _] = Layout::horizontal([
        Constraint::Percentage(20),
        Constraint::Percentage(60),
        Constraint::Percentage(20),
    ])
    .areas(inner);

    let [_, label, _, upload, _, generate, _, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3), // Dropdown label
        Constraint::Length(1),
        Constraint::Length(3), // Upload
        Constraint::Length(1),
        Constraint::Length(3), // Generate button
        Constraint::Min(0),
        Constraint::Length(1), // Status line
    ])
    .areas(column);

    // The option list hangs below the label and covers whatever is there
    let wanted = option_count as u16 + 2;
    let room = inner.bottom().saturating_sub(label.bottom());
    let list = Rect {
        x: label.x,
        y: label.bottom(),
        width: label.width,
        height: wanted.min(room),
    };

    ScreenLayout {
        label,
        list,
        upload,
        generate,
        status,
    }
}

fn list_rows(list: Rect) -> Rect {
    list.inner(Margin {
        horizontal: 1,
        vertical: 1,
    })
}

/// First option drawn when the list is too short to show them all
pub fn list_offset(list: Rect, cursor: usize) -> usize {
    let height = list_rows(list).height as usize;
    if height > 0 && cursor >= height {
        cursor + 1 - height
    } else {
        0
    }
}

/// Index of the option under `point`, ignoring the list borders
pub fn option_at(list: Rect, point: Position, offset: usize) -> Option<usize> {
    let rows = list_rows(list);
    rows.contains(point).then(|| offset + (point.y - rows.y) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_hangs_below_label() {
        let layout = screen_layout(Rect::new(0, 0, 100, 40), 12);
        assert_eq!(layout.list.y, layout.label.bottom());
        assert_eq!(layout.list.height, 14);
        assert_eq!(layout.list.width, layout.label.width);
        assert!(layout.list.intersects(layout.upload));
    }

    #[test]
    fn test_list_clipped_on_small_screens() {
        let area = Rect::new(0, 0, 60, 12);
        let layout = screen_layout(area, 12);
        assert!(layout.list.bottom() <= area.bottom() - 1);
    }

    #[test]
    fn test_option_at() {
        let list = Rect::new(10, 5, 20, 14);
        assert_eq!(option_at(list, Position::new(12, 6), 0), Some(0));
        assert_eq!(option_at(list, Position::new(12, 17), 0), Some(11));
        // borders
        assert_eq!(option_at(list, Position::new(12, 5), 0), None);
        assert_eq!(option_at(list, Position::new(10, 8), 0), None);
    }

    #[test]
    fn test_list_offset_follows_cursor() {
        // 4 visible rows
        let list = Rect::new(0, 0, 20, 6);
        assert_eq!(list_offset(list, 0), 0);
        assert_eq!(list_offset(list, 3), 0);
        assert_eq!(list_offset(list, 4), 1);
        assert_eq!(list_offset(list, 11), 8);
        // Clicking the top row of a scrolled list hits the offset row
        assert_eq!(option_at(list, Position::new(2, 1), 8), Some(8));
        // Full-height list never scrolls
        assert_eq!(list_offset(Rect::new(0, 0, 20, 14), 11), 0);
    }
}
