//! Rendered log record

use super::arg::{format_message, LogArg, TIME_FORMAT};
use super::level::LogLevel;
use chrono::Local;
use std::fmt;
use std::panic::Location;
use std::path::Path;

/// One fully rendered log event
///
/// Everything is captured on the calling thread when the line is built, so
/// the worker only ever moves finished text around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    /// Final path component of the call site
    pub source: String,
    pub line: u32,
    pub thread_id: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    /// Build a line from an already rendered message
    pub fn new(level: LogLevel, file: &str, line: u32, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format(TIME_FORMAT).to_string(),
            source: source_name(file),
            line,
            thread_id: thread_id(),
            level,
            message: message.into(),
        }
    }

    /// Build a line by substituting `args` into the `{}` placeholders of `format`
    pub fn format(level: LogLevel, file: &str, line: u32, format: &str, args: &[LogArg]) -> Self {
        Self::new(level, file, line, format_message(format, args))
    }

    /// Build a line located at the caller
    #[track_caller]
    pub fn here(level: LogLevel, format: &str, args: &[LogArg]) -> Self {
        let location = Location::caller();
        Self::format(level, location.file(), location.line(), format, args)
    }
}

/// File rendering: `<timestamp> <source>:<line> <thread> <level> <message>`
impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} {} {:>7} {}",
            self.timestamp, self.source, self.line, self.thread_id, self.level, self.message
        )
    }
}

fn source_name(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

#[cfg(target_os = "linux")]
fn thread_id() -> String {
    // SAFETY: gettid has no preconditions and cannot fail.
    let tid = unsafe { libc::syscall(libc::SYS_gettid) };
    format!("[{}]", tid)
}

#[cfg(not(target_os = "linux"))]
fn thread_id() -> String {
    format!("{:?}", std::thread::current().id())
}
