//! Toolkit-wide constants
//!
//! Default values for every configuration key the core reads.

use std::time::Duration;

// =============================================================================
// Config
// =============================================================================

/// System-wide directory searched first for `<program>.toml`
pub const SYSTEM_CONFIG_DIR: &str = "/etc/tasp";

/// Extension of the config file derived from the program name
pub const CONFIG_EXTENSION: &str = "toml";

/// Key listing extra config files merged into the main document
pub const INCLUDE_KEY: &str = "include";

/// Permission bits for directories the toolkit creates (owner + group)
pub const DIR_MODE: u32 = 0o770;

// =============================================================================
// Logging pipeline
// =============================================================================

/// Flush interval of the logging worker when `logging.timeout` is absent
pub const DEFAULT_LOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Lower bound for `logging.timeout`, keeps the worker from spinning
pub const MIN_LOG_TIMEOUT: Duration = Duration::from_millis(10);

/// Prefix of every sink's configuration subtree
pub const SINKS_KEY: &str = "logging.sinks";

/// Sink types used when `logging.sinks` is absent
pub const DEFAULT_SINKS: &[&str] = &["file"];

/// Name of the logging worker thread
pub const LOG_WORKER_THREAD: &str = "tasp-log-worker";

// =============================================================================
// File sink
// =============================================================================

/// Directory under `program.path` used when the file sink has no `path`
pub const DEFAULT_LOG_DIR: &str = "log";

/// Extension appended to the program name when the file sink has no `name`
pub const LOG_EXTENSION: &str = "log";

/// Default rotation threshold (megabytes)
pub const DEFAULT_ROTATE_MAX_SIZE_MB: u64 = 10;

/// Default number of rotated generations kept
pub const DEFAULT_ROTATE_MAX_FILES: u32 = 10;

// =============================================================================
// PID guard
// =============================================================================

/// Directory under `program.path` used when `pid.path` is absent
pub const DEFAULT_PID_DIR: &str = "pid";

/// Extension appended to the program name when `pid.name` is absent
pub const PID_EXTENSION: &str = "pid";

/// Key holding the owning process id inside the PID file
pub const PID_KEY: &str = "pid";

// =============================================================================
// Exit codes
// =============================================================================

/// `exec` result after a terminating signal
pub const EXIT_OK: i32 = 0;

/// `exec` result when another instance already runs
pub const EXIT_SECOND_LAUNCH: i32 = 1;

/// `exec` result when waiting for signals fails
pub const EXIT_FAILURE: i32 = 1;
