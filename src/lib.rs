pub mod api;
pub mod config;
pub mod dropdown;
pub mod logging;
pub mod ui;
pub mod util;
pub mod workflow;

pub use api::ProcessClient;
pub use config::{AppConfig, run_config_wizard};
pub use dropdown::{ClickTarget, MonthDropdown};
pub use ui::app::App;
pub use util::{format_bytes, format_elapsed, format_timestamp};
pub use workflow::{DirectorySink, DownloadSink, Notifier, Outcome, UploadError};
