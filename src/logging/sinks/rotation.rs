//! Size-based log file rotation
//!
//! Generations are `<file>.1` (newest) up to `<file>.<max_files>` (oldest).
//! Shifting is best effort: a failed rename is skipped silently and the
//! active file is reopened regardless.

use super::SinkContext;
use crate::constants::{DEFAULT_ROTATE_MAX_FILES, DEFAULT_ROTATE_MAX_SIZE_MB};
use std::fs;
use std::path::{Path, PathBuf};

const MEGABYTE: u64 = 1024 * 1024;

/// Rotation counter of one file sink
#[derive(Debug)]
pub struct Rotation {
    path: PathBuf,
    enabled: bool,
    current_size: u64,
    max_size: u64,
    max_files: u32,
}

impl Rotation {
    /// Read `<sink>.rotate.*` and seed the counter from the file on disk
    pub fn new(ctx: &SinkContext<'_>, path: &Path) -> Self {
        let max_size_mb: u64 = ctx
            .config
            .get(&ctx.key("rotate.max_size"), DEFAULT_ROTATE_MAX_SIZE_MB);
        Self::with_limits(
            path,
            ctx.config.get(&ctx.key("rotate.enable"), false),
            max_size_mb.saturating_mul(MEGABYTE),
            ctx.config
                .get(&ctx.key("rotate.max_files"), DEFAULT_ROTATE_MAX_FILES),
        )
    }

    /// Explicit limits, `max_size` in bytes
    pub fn with_limits(path: &Path, enabled: bool, max_size: u64, max_files: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            enabled,
            current_size: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            max_size,
            max_files,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Bytes counted since the last rotation
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Account for `next_len` more bytes and rotate once the limit is reached
    ///
    /// Returns true when the generations were shifted; the caller must then
    /// reopen the active file before writing.
    pub fn rotate(&mut self, next_len: u64) -> bool {
        if !self.enabled {
            return false;
        }

        self.current_size = self.current_size.saturating_add(next_len);
        if self.current_size < self.max_size {
            return false;
        }

        for n in (1..=self.max_files).rev() {
            let from = if n == 1 {
                self.path.clone()
            } else {
                self.generation(n - 1)
            };
            let _ = fs::rename(from, self.generation(n));
        }

        self.current_size = 0;
        true
    }

    fn generation(&self, n: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }
}
