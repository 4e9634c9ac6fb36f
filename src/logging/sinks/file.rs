//! File sink
//!
//! Lines are appended through a `BufWriter`; the worker flushes after every
//! drain. When rotation shifts the active file away, the handle is reopened
//! on a fresh file before the pending line is written.

use super::rotation::Rotation;
use super::{Sink, SinkContext};
use crate::config::create_dir;
use crate::constants::{DEFAULT_LOG_DIR, LOG_EXTENSION};
use crate::error::{Result, TaspError};
use crate::logging::level::LogLevel;
use crate::logging::line::LogLine;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::error;

pub struct FileSink {
    threshold: LogLevel,
    path: PathBuf,
    writer: BufWriter<File>,
    rotation: Rotation,
    /// Set after a failed write, cleared by the next good one
    failing: bool,
}

impl FileSink {
    /// Open `<path>/<name>` for append, creating the directory if needed
    ///
    /// `path` defaults to `<program.path>/log`, `name` to `<program.name>.log`.
    pub fn new(ctx: &SinkContext<'_>) -> Result<Self> {
        let path = Self::resolve_path(ctx);
        if let Some(dir) = path.parent() {
            create_dir(dir)?;
        }

        let writer = open_append(&path).map_err(|e| TaspError::io(&path, e))?;
        let mut sink = Self {
            threshold: ctx.threshold(),
            rotation: Rotation::new(ctx, &path),
            path,
            writer,
            failing: false,
        };

        if sink.rotation.rotate(0) {
            sink.reopen()?;
        }
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn resolve_path(ctx: &SinkContext<'_>) -> PathBuf {
        let dir = ctx
            .config
            .get_path(&ctx.key("path"))
            .unwrap_or_else(|| ctx.config.program_path().join(DEFAULT_LOG_DIR));
        let name = ctx
            .config
            .get_path(&ctx.key("name"))
            .unwrap_or_else(|| {
                PathBuf::from(format!("{}.{}", ctx.config.program_name(), LOG_EXTENSION))
            });
        dir.join(name)
    }

    fn reopen(&mut self) -> Result<()> {
        let _ = self.writer.flush();
        self.writer = open_append(&self.path).map_err(|e| TaspError::io(&self.path, e))?;
        Ok(())
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    fn report(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.failing = false,
            Err(e) if !self.failing => {
                self.failing = true;
                error!("Log file write failed: {}", e);
            }
            Err(_) => {}
        }
    }
}

impl Sink for FileSink {
    fn kind(&self) -> &str {
        "file"
    }

    fn threshold(&self) -> LogLevel {
        self.threshold
    }

    fn write(&mut self, line: &LogLine) {
        let text = line.to_string();

        let result = if self.rotation.rotate(text.len() as u64 + 1) {
            self.reopen()
        } else {
            Ok(())
        };
        let result =
            result.and_then(|()| self.append(&text).map_err(|e| TaspError::io(&self.path, e)));
        self.report(result);
    }

    fn flush(&mut self) {
        let result = self
            .writer
            .flush()
            .map_err(|e| TaspError::io(&self.path, e));
        self.report(result);
    }
}

fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigGlobal};
    use std::fs;

    fn config_for(dir: &Path, extra: &str) -> ConfigGlobal {
        let text = format!(
            "[logging.sinks.file]\npath = {:?}\nname = \"app.log\"\n{}",
            dir.to_string_lossy(),
            extra
        );
        ConfigGlobal::from_config(Config::parse(&text).unwrap())
    }

    #[test]
    fn test_writes_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), "");
        let ctx = SinkContext::new(&config, "file");
        let mut sink = FileSink::new(&ctx).unwrap();

        sink.print(&LogLine::new(LogLevel::Info, "src/main.rs", 7, "hello"));
        sink.print(&LogLine::new(LogLevel::Debug, "src/main.rs", 8, "hidden"));
        sink.flush();

        let text = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(" main.rs:7 "));
        assert!(text.trim_end().ends_with("   Info hello"));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.log"), "old\n").unwrap();

        let config = config_for(dir.path(), "");
        let ctx = SinkContext::new(&config, "file");
        let mut sink = FileSink::new(&ctx).unwrap();
        sink.print(&LogLine::new(LogLevel::Error, "x.rs", 1, "new"));
        sink.flush();

        let text = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(text.starts_with("old\n"));
        assert!(text.ends_with("new\n"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let config = config_for(&nested, "");
        let ctx = SinkContext::new(&config, "file");
        let sink = FileSink::new(&ctx).unwrap();
        assert_eq!(sink.path(), nested.join("app.log"));
        assert!(nested.is_dir());
    }

    #[test]
    fn test_default_location_uses_program_keys() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            "[program]\nname = \"svc\"\npath = {:?}\n",
            dir.path().to_string_lossy()
        );
        let config = ConfigGlobal::from_config(Config::parse(&text).unwrap());
        let ctx = SinkContext::new(&config, "file");
        let sink = FileSink::new(&ctx).unwrap();
        assert_eq!(sink.path(), dir.path().join("log").join("svc.log"));
    }

    #[test]
    fn test_oversized_file_rotates_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.log"), vec![b'x'; 2 * 1024 * 1024]).unwrap();

        let config = config_for(
            dir.path(),
            "[logging.sinks.file.rotate]\nenable = true\nmax_size = 1\nmax_files = 2\n",
        );
        let ctx = SinkContext::new(&config, "file");
        let mut sink = FileSink::new(&ctx).unwrap();
        sink.print(&LogLine::new(LogLevel::Info, "x.rs", 1, "fresh"));
        sink.flush();

        let rotated = fs::metadata(dir.path().join("app.log.1")).unwrap();
        assert_eq!(rotated.len(), 2 * 1024 * 1024);
        let text = fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(text.ends_with("fresh\n"));
    }

    #[test]
    fn test_unwritable_directory_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file-not-dir");
        fs::write(&blocker, "").unwrap();

        let config = config_for(&blocker, "");
        let ctx = SinkContext::new(&config, "file");
        assert!(FileSink::new(&ctx).is_err());
    }
}
