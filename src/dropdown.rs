//! Month dropdown: open/close state, checkbox selection and the label that mirrors it.
use ratatui::layout::{Position, Rect};
use std::fmt;

pub const PLACEHOLDER: &str = "Select Months";
pub const SEPARATOR: &str = ", ";

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Visual state of the arrow next to the label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Closed,
    Open,
}

impl Indicator {
    pub fn glyph(&self) -> &'static str {
        match self {
            Indicator::Closed => "🢓",
            Indicator::Open => "🢑",
        }
    }

    pub fn margin_top(&self) -> i16 {
        match self {
            Indicator::Closed => 16,
            Indicator::Open => -32,
        }
    }
}

/// Where a click landed, relative to the dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Label,
    List,
    Outside,
}

/// True when `point` is in none of the `inside` areas
pub fn click_outside(point: Position, inside: &[Rect]) -> bool {
    !inside.iter().any(|area| area.contains(point))
}

// The label wins over the list; a closed list has no area
pub fn classify_click(point: Position, label: Rect, list: Option<Rect>) -> ClickTarget {
    if label.contains(point) {
        ClickTarget::Label
    } else if click_outside(point, list.as_slice()) {
        ClickTarget::Outside
    } else {
        ClickTarget::List
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthOption {
    pub value: String,
    pub checked: bool,
}

type Subscriber = Box<dyn FnMut(&str) + Send>;

pub struct MonthDropdown {
    open: bool,
    indicator: Indicator,
    options: Vec<MonthOption>,
    selected: Vec<String>,
    selection: String,
    label: String,
    cursor: usize,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for MonthDropdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonthDropdown")
            .field("open", &self.open)
            .field("selection", &self.selection)
            .field("cursor", &self.cursor)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for MonthDropdown {
    fn default() -> Self {
        Self::new(MONTHS)
    }
}

impl MonthDropdown {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            open: false,
            indicator: Indicator::Closed,
            options: values
                .into_iter()
                .map(|v| MonthOption {
                    value: v.into(),
                    checked: false,
                })
                .collect(),
            selected: vec![],
            selection: String::new(),
            label: PLACEHOLDER.to_string(),
            cursor: 0,
            subscribers: vec![],
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn options(&self) -> &[MonthOption] {
        &self.options
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The selection string sent to the backend, empty when nothing is checked
    pub fn selection(&self) -> &str {
        &self.selection
    }

    pub fn selected_months(&self) -> &[String] {
        &self.selected
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register a callback that receives the new selection after every checkbox change
    pub fn on_change<F>(&mut self, callback: F)
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open = true;
            self.indicator = Indicator::Open;
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.indicator = Indicator::Closed;
    }

    pub fn handle_click(&mut self, target: ClickTarget) {
        match target {
            ClickTarget::Label => self.toggle(),
            ClickTarget::List => {}
            // Never re-opens
            ClickTarget::Outside => {
                if self.open {
                    self.close();
                }
            }
        }
    }

    pub fn set_checked(&mut self, index: usize, checked: bool) {
        let Some(option) = self.options.get_mut(index) else {
            return;
        };
        option.checked = checked;
        self.recompute();
    }

    pub fn toggle_option(&mut self, index: usize) {
        if let Some(option) = self.options.get(index) {
            let checked = !option.checked;
            self.set_checked(index, checked);
        }
    }

    pub fn toggle_at_cursor(&mut self) {
        self.toggle_option(self.cursor);
    }

    // Move down in the option list
    pub fn next(&mut self) {
        if !self.options.is_empty() {
            self.cursor = (self.cursor + 1) % self.options.len();
        }
    }

    // Move up in the option list
    pub fn previous(&mut self) {
        let count = self.options.len();
        if count > 0 {
            self.cursor = (self.cursor + count - 1) % count;
        }
    }

    // Derived from scratch on every change, in list order
    fn recompute(&mut self) {
        self.selected = self
            .options
            .iter()
            .filter(|o| o.checked)
            .map(|o| o.value.clone())
            .collect();
        self.selection = self.selected.join(SEPARATOR);
        self.label = if self.selection.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            self.selection.clone()
        };

        let selection = self.selection.clone();
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&selection);
        }
    }
}
