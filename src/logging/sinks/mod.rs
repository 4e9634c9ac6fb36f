//! Log destinations
//!
//! - `ConsoleSink` - colored lines on stdout (or any writer)
//! - `FileSink` - append-only file with optional size-based rotation
//! - `SyslogSink` - the local syslog daemon (unix)
//!
//! Each sink reads its settings from `logging.sinks.<type>` once, when it is
//! built. The worker rebuilds every sink on reload, so a changed setting
//! takes effect through a fresh instance rather than through mutation.

mod console;
mod file;
mod rotation;
#[cfg(unix)]
mod syslog;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use rotation::Rotation;
#[cfg(unix)]
pub use syslog::SyslogSink;

use super::level::LogLevel;
use super::line::LogLine;
use crate::config::ConfigGlobal;
use crate::constants::SINKS_KEY;
use crate::error::Result;
use std::collections::HashMap;

/// A log destination with its own minimum level
pub trait Sink: Send {
    /// Registered type name (`"file"`, `"console"`, ...)
    fn kind(&self) -> &str;

    fn threshold(&self) -> LogLevel;

    /// Emit a line unconditionally
    fn write(&mut self, line: &LogLine);

    /// Push buffered output to the destination
    fn flush(&mut self) {}

    /// Emit a line if it reaches the threshold
    fn print(&mut self, line: &LogLine) {
        if line.level >= self.threshold() {
            self.write(line);
        }
    }
}

/// What a sink constructor gets to look at
pub struct SinkContext<'a> {
    pub config: &'a ConfigGlobal,
    /// Config subtree of this sink, `logging.sinks.<type>`
    pub path: String,
}

impl<'a> SinkContext<'a> {
    pub fn new(config: &'a ConfigGlobal, kind: &str) -> Self {
        Self {
            config,
            path: format!("{}.{}", SINKS_KEY, kind),
        }
    }

    /// Full key path of a setting below this sink
    pub fn key(&self, name: &str) -> String {
        format!("{}.{}", self.path, name)
    }

    /// `<path>.level`, `Info` when absent
    pub fn threshold(&self) -> LogLevel {
        self.config.get(&self.key("level"), LogLevel::Info)
    }

    pub fn enabled(&self) -> bool {
        self.config.get(&self.key("enable"), true)
    }
}

/// Boxed sink constructor
pub type SinkCtor = Box<dyn Fn(&SinkContext<'_>) -> Result<Box<dyn Sink>> + Send + Sync>;

/// Sink type name to constructor table
pub struct SinkFactory {
    ctors: HashMap<String, SinkCtor>,
}

impl SinkFactory {
    /// Factory without any sink types
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    /// Add or replace the constructor for `name`
    pub fn register<F>(&mut self, name: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn(&SinkContext<'_>) -> Result<Box<dyn Sink>> + Send + Sync + 'static,
    {
        self.ctors.insert(name.into(), Box::new(ctor));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    /// Build a sink of type `name`, `None` when the type is unknown
    pub fn create(&self, name: &str, ctx: &SinkContext<'_>) -> Option<Result<Box<dyn Sink>>> {
        self.ctors.get(name).map(|ctor| ctor(ctx))
    }
}

impl Default for SinkFactory {
    /// `file`, `console` and (on unix) `syslog`
    fn default() -> Self {
        let mut factory = Self::empty();
        factory
            .register("file", |ctx| Ok(Box::new(FileSink::new(ctx)?) as Box<dyn Sink>))
            .register("console", |ctx| Ok(Box::new(ConsoleSink::new(ctx)) as Box<dyn Sink>));
        #[cfg(unix)]
        factory.register("syslog", |ctx| Ok(Box::new(SyslogSink::new(ctx)?) as Box<dyn Sink>));
        factory
    }
}
