//! Single-instance guard
//!
//! The PID file is a small config document holding `pid = <int>`. A guard
//! whose process id is recorded there owns the file and removes it on drop;
//! a guard that finds another live process recorded leaves it alone and
//! reports a second launch.

use crate::config::{Config, ConfigGlobal};
use crate::constants::{DEFAULT_PID_DIR, PID_EXTENSION, PID_KEY};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

pub struct PidGuard {
    file: Config,
    current: i32,
    running: i32,
}

impl PidGuard {
    /// Guard for the calling process
    pub fn new(config: &ConfigGlobal) -> Self {
        Self::for_pid(config, std::process::id() as i32)
    }

    /// Guard on behalf of process `pid`
    ///
    /// Location: `pid.path` (default `<program.path>/pid`) and `pid.name`
    /// (default `<program.name>.pid`).
    pub fn for_pid(config: &ConfigGlobal, pid: i32) -> Self {
        let path = Self::resolve_path(config);

        let mut file = if path.exists() {
            Config::from_file(&path)
        } else {
            let mut file = Config::new();
            file.set_path(&path);
            file
        };

        let recorded: i32 = file.get(PID_KEY, 0);
        if recorded > 0 && recorded != pid && is_alive(recorded) {
            warn!("Process {} already owns {}", recorded, path.display());
            return Self {
                file,
                current: pid,
                running: recorded,
            };
        }

        if let Err(e) = file.set(PID_KEY, pid).and_then(|()| file.save()) {
            error!("PID file not written: {}", e);
        } else {
            debug!("PID {} recorded in {}", pid, file.path().display());
        }

        Self {
            file,
            current: pid,
            running: pid,
        }
    }

    fn resolve_path(config: &ConfigGlobal) -> PathBuf {
        let dir = config
            .get_path("pid.path")
            .unwrap_or_else(|| config.program_path().join(DEFAULT_PID_DIR));
        let name = config.get_path("pid.name").unwrap_or_else(|| {
            PathBuf::from(format!("{}.{}", config.program_name(), PID_EXTENSION))
        });
        dir.join(name)
    }

    /// Process id this guard acts for
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Process id that owns the PID file
    pub fn running(&self) -> i32 {
        self.running
    }

    pub fn second_launch(&self) -> bool {
        self.current != self.running
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for PidGuard {
    fn drop(&mut self) {
        if self.second_launch() {
            return;
        }
        if let Err(e) = std::fs::remove_file(self.file.path()) {
            warn!("PID file {} not removed: {}", self.file.path().display(), e);
        }
    }
}

/// `kill(pid, 0)`; a process we may not signal still exists
#[cfg(unix)]
fn is_alive(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(not(unix))]
fn is_alive(_pid: i32) -> bool {
    false
}
