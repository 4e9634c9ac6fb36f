//! tasp - base toolkit for long-running services
//!
//! - `Daemon` - startup, signal loop, reload and shutdown
//! - `logging` - asynchronous pipeline feeding console, file and syslog sinks
//! - `config` - TOML documents addressed by dot-separated key paths
//! - `PidGuard` - single-instance enforcement through a PID file
//!
//! ```no_run
//! use tasp::{log_info, Daemon};
//!
//! fn main() -> anyhow::Result<()> {
//!     let code = {
//!         let mut daemon = Daemon::new(std::env::args_os())?;
//!         let logger = daemon.logger();
//!         daemon.on_reload(move || log_info!(logger, "configuration reloaded"));
//!         daemon.exec()
//!     };
//!     std::process::exit(code);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pid;
pub mod task;

#[cfg(unix)]
pub mod crash;
#[cfg(unix)]
pub mod daemon;
#[cfg(unix)]
pub mod signals;

pub use config::{Config, ConfigGlobal};
#[cfg(unix)]
pub use daemon::Daemon;
pub use error::{Result, TaspError};
pub use logging::{LogArg, LogLevel, LogLine, Logger, Logging};
pub use pid::PidGuard;
