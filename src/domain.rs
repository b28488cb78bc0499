use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;

use crate::filter::FilterMode;
use crate::source::LoadState;

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/users";
pub const DEFAULT_PAGE_SIZE: usize = 5;

pub const HELP_TEXT: &str = "\
q         Quit
←/→, h/l  Select column
s, Enter  Sort by selected column (repeat to reverse)
f         Edit filter of selected column (global query in global mode)
/         Edit global query
o         Cycle filter operator of selected column
m         Switch between global and per-column filtering
x         Clear all filters
n, PgDn   Next page
p, PgUp   Previous page
?         Show this help
Esc       Close popup / cancel input";

#[derive(Debug)]
pub enum JVError {
    IoError(Error),
    RequestFailed(reqwest::Error),
    BadStatus(u16),
    DecodeFailed(String),
    InvalidConfig(String),
}

impl fmt::Display for JVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JVError::IoError(e) => write!(f, "{e}"),
            JVError::RequestFailed(e) => write!(f, "{e}"),
            // Status codes are not surfaced to the user, only to the log.
            JVError::BadStatus(_) => write!(f, "Network response was not ok"),
            JVError::DecodeFailed(msg) => write!(f, "Could not decode response: {msg}"),
            JVError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for JVError {}

impl From<Error> for JVError {
    fn from(err: Error) -> Self {
        JVError::IoError(err)
    }
}

impl From<reqwest::Error> for JVError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JVError::DecodeFailed(err.to_string())
        } else {
            JVError::RequestFailed(err)
        }
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct JVConfig {
    #[setters(into)]
    pub endpoint: String,
    pub page_size: usize,
    pub filter_mode: FilterMode,
    pub reset_page_on_filter: bool,
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub column_spacing: u16,
}

impl Default for JVConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            filter_mode: FilterMode::Columns,
            reset_page_on_filter: false,
            event_poll_time: 100,
            max_column_width: 40,
            column_spacing: 1,
        }
    }
}

impl JVConfig {
    pub fn validate(self) -> Result<Self, JVError> {
        if self.page_size == 0 {
            return Err(JVError::InvalidConfig("page size must be at least 1".into()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(JVError::InvalidConfig("endpoint must not be empty".into()));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    GlobalQuery,
    ColumnFilter,
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Loaded(LoadState),
    SelectLeft,
    SelectRight,
    Sort,
    EditFilter,
    EditQuery,
    CycleOperator,
    ToggleFilterMode,
    ClearFilters,
    NextPage,
    PreviousPage,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
