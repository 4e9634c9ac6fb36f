//! Configuration management
//!
//! Hierarchical key/value documents stored as TOML and addressed by
//! dot-separated key paths (`logging.sinks.file.level`).
//!
//! - `Config` - a single document bound to a file (also used for PID files)
//! - `ConfigGlobal` - the process-wide document, shared behind a lock
//!
//! Lookups never fail: a missing key or a value of the wrong type yields the
//! caller's default, and a type mismatch is reported as a warning.

mod global;
mod store;
mod value;

pub use global::{default_path, program_info, ConfigGlobal, ProgramInfo};
pub use store::Config;
pub(crate) use store::create_dir;
