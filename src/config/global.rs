//! Process-wide configuration
//!
//! Config file location:
//! 1. `--config PATH` when given
//! 2. `/etc/tasp/<program>.toml` when it exists
//! 3. `<program-dir>/<program>.toml`

use super::store::Config;
use super::value::{convert, convert_list, convert_seconds};
use crate::constants::{CONFIG_EXTENSION, SYSTEM_CONFIG_DIR};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Name and directory of the running executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub name: String,
    pub path: PathBuf,
}

/// Resolve the running executable (symlinks followed)
pub fn program_info() -> ProgramInfo {
    let exe = std::env::current_exe().and_then(std::fs::canonicalize);
    match exe {
        Ok(exe) => ProgramInfo {
            name: exe
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "tasp".to_string()),
            path: exe.parent().map(Path::to_path_buf).unwrap_or_default(),
        },
        Err(e) => {
            warn!("Cannot resolve executable path: {}", e);
            ProgramInfo {
                name: "tasp".to_string(),
                path: PathBuf::from("."),
            }
        }
    }
}

/// Default config file path for the running program
pub fn default_path() -> PathBuf {
    let program = program_info();
    let file = Path::new(&program.name).with_extension(CONFIG_EXTENSION);

    let system = Path::new(SYSTEM_CONFIG_DIR).join(&file);
    if system.exists() {
        system
    } else {
        program.path.join(file)
    }
}

/// Shared process-wide config document
///
/// Readers take a read lock only long enough to clone the requested node;
/// conversion and any warnings happen after the lock is released, so code
/// that logs can never hold this lock.
#[derive(Debug)]
pub struct ConfigGlobal {
    inner: RwLock<Config>,
}

impl ConfigGlobal {
    /// Load the global config from `path` or the default search path
    ///
    /// Sets `program.name`, `program.path`, `program.systemd`, then merges
    /// included files.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_path);
        Self {
            inner: RwLock::new(Self::prepare(Config::from_file(path))),
        }
    }

    /// Wrap an already-built document (embedding and tests)
    ///
    /// The `program.*` keys are only filled in where the document lacks them.
    pub fn from_config(config: Config) -> Self {
        Self {
            inner: RwLock::new(Self::prepare(config)),
        }
    }

    fn prepare(mut config: Config) -> Config {
        let from_file = !config.path().as_os_str().is_empty();
        let program = program_info();
        let systemd = parent_is_init();

        let base: [(&str, toml::Value); 3] = [
            ("program.name", program.name.into()),
            (
                "program.path",
                program.path.to_string_lossy().into_owned().into(),
            ),
            ("program.systemd", systemd.into()),
        ];
        for (key, value) in base {
            if !from_file && config.node(key).is_some() {
                continue;
            }
            if let Err(e) = config.set(key, value) {
                warn!("Cannot set {}: {}", key, e);
            }
        }

        if from_file {
            config.include();
        }
        config
    }

    // === Lookup ===

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let node = self.inner.read().node(key).cloned();
        convert(key, node, default)
    }

    pub fn get_list(&self, key: &str, default: &[&str]) -> Vec<String> {
        let node = self.inner.read().node(key).cloned();
        convert_list(key, node, default)
    }

    pub fn get_seconds(&self, key: &str, default: Duration) -> Duration {
        let node = self.inner.read().node(key).cloned();
        convert_seconds(key, node, default)
    }

    /// Path-valued key; an empty string counts as absent
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        let path: PathBuf = self.get(key, PathBuf::new());
        (!path.as_os_str().is_empty()).then_some(path)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) {
        let result = self.inner.write().set(key, value);
        if let Err(e) = result {
            warn!("Config value not stored: {}", e);
        }
    }

    /// Program name recorded at load time
    pub fn program_name(&self) -> String {
        self.get("program.name", "tasp".to_string())
    }

    /// Program directory recorded at load time
    pub fn program_path(&self) -> PathBuf {
        self.get_path("program.path").unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn path(&self) -> PathBuf {
        self.inner.read().path().to_path_buf()
    }

    /// Copy of the whole document
    pub fn snapshot(&self) -> Config {
        self.inner.read().clone()
    }

    // === Persistence ===

    /// Re-read the config file, re-apply `program.*` and includes
    ///
    /// The new document is built off-lock and swapped in at the end.
    pub fn reload(&self) {
        let mut fresh = self.snapshot();
        fresh.reload();
        let fresh = Self::prepare(fresh);
        *self.inner.write() = fresh;
    }

    pub fn save(&self) -> crate::error::Result<()> {
        self.snapshot().save()
    }
}

impl fmt::Display for ConfigGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.snapshot(), f)
    }
}

#[cfg(unix)]
fn parent_is_init() -> bool {
    nix::unistd::getppid().as_raw() == 1
}

#[cfg(not(unix))]
fn parent_is_init() -> bool {
    false
}

// ============================================================================
// Tests
// ============================================================================
