//! Syslog sink
//!
//! `openlog` keeps a pointer to the ident string, so the `CString` lives in
//! the sink until `closelog` runs in `Drop`. There is a single syslog
//! channel per process: the pipeline drops the previous sink set before it
//! builds the next one so a late `closelog` never closes a fresh channel.

use super::{Sink, SinkContext};
use crate::error::{Result, TaspError};
use crate::logging::level::LogLevel;
use crate::logging::line::LogLine;
use std::ffi::CString;

pub struct SyslogSink {
    threshold: LogLevel,
    _ident: CString,
}

impl SyslogSink {
    /// Open the syslog channel tagged with `program.name`
    pub fn new(ctx: &SinkContext<'_>) -> Result<Self> {
        let ident = CString::new(ctx.config.program_name()).map_err(|e| TaspError::ConfigValue {
            key: "program.name".to_string(),
            reason: e.to_string(),
        })?;

        // SAFETY: ident outlives the channel, it is only dropped after closelog.
        unsafe { libc::openlog(ident.as_ptr(), libc::LOG_PID, libc::LOG_USER) };

        Ok(Self {
            threshold: ctx.threshold(),
            _ident: ident,
        })
    }
}

fn priority(level: LogLevel) -> libc::c_int {
    match level {
        LogLevel::Debug => libc::LOG_DEBUG,
        LogLevel::Info | LogLevel::None => libc::LOG_INFO,
        LogLevel::Warning => libc::LOG_WARNING,
        LogLevel::Error => libc::LOG_ERR,
    }
}

impl Sink for SyslogSink {
    fn kind(&self) -> &str {
        "syslog"
    }

    fn threshold(&self) -> LogLevel {
        self.threshold
    }

    fn write(&mut self, line: &LogLine) {
        let message = CString::new(line.message.replace('\0', "")).unwrap_or_default();
        // SAFETY: both strings are NUL-terminated and the format consumes one %s.
        unsafe {
            libc::syslog(
                priority(line.level),
                b"%s\0".as_ptr().cast::<libc::c_char>(),
                message.as_ptr(),
            )
        };
    }
}

impl Drop for SyslogSink {
    fn drop(&mut self) {
        // SAFETY: closelog has no preconditions.
        unsafe { libc::closelog() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigGlobal};

    #[test]
    fn test_priority_map() {
        assert_eq!(priority(LogLevel::Debug), libc::LOG_DEBUG);
        assert_eq!(priority(LogLevel::Info), libc::LOG_INFO);
        assert_eq!(priority(LogLevel::Warning), libc::LOG_WARNING);
        assert_eq!(priority(LogLevel::Error), libc::LOG_ERR);
        assert_eq!(priority(LogLevel::None), libc::LOG_INFO);
    }

    #[test]
    fn test_open_write_close() {
        let config = ConfigGlobal::from_config(
            Config::parse("[logging.sinks.syslog]\nlevel = \"Error\"\n").unwrap(),
        );
        let ctx = SinkContext::new(&config, "syslog");
        let mut sink = SyslogSink::new(&ctx).unwrap();
        assert_eq!(sink.threshold(), LogLevel::Error);
        sink.print(&LogLine::new(LogLevel::Debug, "x.rs", 1, "filtered"));
        sink.print(&LogLine::new(LogLevel::Error, "x.rs", 1, "tasp syslog sink test"));
    }
}
