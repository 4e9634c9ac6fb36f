//! Centralized error types for the toolkit
//!
//! All toolkit errors are represented by the `TaspError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, TaspError>`.
//!
//! Most of these never reach a caller: the lifecycle and logging code
//! catches them at the component boundary, logs them and falls back to a
//! default. They exist so the helpers underneath can use `?`.

use std::fmt;
use std::path::PathBuf;

/// All toolkit errors
#[derive(Debug)]
pub enum TaspError {
    // === IO ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Config ===
    /// Config file is not valid TOML
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Config document could not be serialized
    ConfigSerialize { source: toml::ser::Error },
    /// Value at a key path has the wrong type
    ConfigValue { key: String, reason: String },

    // === Runtime ===
    /// Failed to spawn a named worker thread
    ThreadSpawn {
        name: String,
        source: std::io::Error,
    },
    /// Signal mask or handler setup failed
    #[cfg(unix)]
    Signal {
        action: &'static str,
        source: nix::Error,
    },
}

impl std::error::Error for TaspError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } | Self::ThreadSpawn { source, .. } => Some(source),
            Self::ConfigParse { source, .. } => Some(source),
            Self::ConfigSerialize { source } => Some(source),
            #[cfg(unix)]
            Self::Signal { source, .. } => Some(source),
            Self::ConfigValue { .. } => None,
        }
    }
}

impl fmt::Display for TaspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "IO error: {}: {}", path.display(), source),
            Self::ConfigParse { path, source } => {
                write!(f, "Cannot parse config {}: {}", path.display(), source)
            }
            Self::ConfigSerialize { source } => write!(f, "Cannot serialize config: {}", source),
            Self::ConfigValue { key, reason } => write!(f, "Invalid value at {}: {}", key, reason),
            Self::ThreadSpawn { name, source } => {
                write!(f, "Cannot spawn thread {}: {}", name, source)
            }
            #[cfg(unix)]
            Self::Signal { action, source } => write!(f, "Cannot {}: {}", action, source),
        }
    }
}

impl TaspError {
    /// Shorthand for wrapping an IO error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Alias for Result with TaspError
pub type Result<T> = std::result::Result<T, TaspError>;
