//! Log severity
//!
//! Levels are totally ordered: `Debug < Info < Warning < Error < None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Log severity, ordered from most to least verbose
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(from = "String", into = "&'static str")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    /// No level / unknown level text
    None,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::None,
    ];

    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::None => "None",
        }
    }

    /// Parse a level name, ignoring ASCII case
    ///
    /// Text that matches no canonical name maps to `None`. Sink filtering is
    /// `line >= threshold`, so a sink configured with an unknown level only
    /// passes lines that themselves carry `None`.
    pub fn parse(text: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(text))
            .unwrap_or(Self::None)
    }

    /// Replace the value from text, see [`LogLevel::parse`]
    pub fn set(&mut self, text: &str) {
        *self = Self::parse(text);
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for LogLevel {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for LogLevel {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.as_str()
    }
}
