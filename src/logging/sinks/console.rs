//! Console sink

use super::{Sink, SinkContext};
use crate::logging::level::LogLevel;
use crate::logging::line::LogLine;
use std::io::{self, Write};

/// Colored `<timestamp> <level> <message>` lines
pub struct ConsoleSink {
    threshold: LogLevel,
    out: Box<dyn Write + Send>,
}

impl ConsoleSink {
    /// Console sink on stdout
    pub fn new(ctx: &SinkContext<'_>) -> Self {
        Self::with_writer(ctx, Box::new(io::stdout()))
    }

    /// Console sink on an arbitrary writer
    pub fn with_writer(ctx: &SinkContext<'_>, out: Box<dyn Write + Send>) -> Self {
        Self {
            threshold: ctx.threshold(),
            out,
        }
    }
}

/// ANSI foreground color of a level tag
fn color(level: LogLevel) -> u8 {
    match level {
        LogLevel::Error => 31,
        LogLevel::Warning => 33,
        LogLevel::Debug => 34,
        _ => 37,
    }
}

impl Sink for ConsoleSink {
    fn kind(&self) -> &str {
        "console"
    }

    fn threshold(&self) -> LogLevel {
        self.threshold
    }

    fn write(&mut self, line: &LogLine) {
        // stdout going away is not worth reporting
        let _ = writeln!(
            self.out,
            "{} \x1b[{}m{}\x1b[0m {}",
            line.timestamp,
            color(line.level),
            line.level,
            line.message
        );
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}
