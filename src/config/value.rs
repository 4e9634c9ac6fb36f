//! Conversion of raw TOML nodes into typed values
//!
//! These helpers take an owned node so callers holding a lock can clone the
//! node, release the lock, and only then convert (conversion may log).

use serde::de::DeserializeOwned;
use std::time::Duration;
use toml::Value;
use tracing::warn;

/// Convert a node with serde, falling back to `default` when absent or invalid
pub(crate) fn convert<T: DeserializeOwned>(key: &str, node: Option<Value>, default: T) -> T {
    let Some(node) = node else {
        return default;
    };

    match node.try_into() {
        Ok(value) => value,
        Err(e) => {
            warn!(key, "Config value has unexpected type, using default: {}", e);
            default
        }
    }
}

/// Read a list of names
///
/// A table is accepted too and yields its keys in document order, so
/// `[logging.sinks.file]` sections double as the list of sink types.
pub(crate) fn convert_list(key: &str, node: Option<Value>, default: &[&str]) -> Vec<String> {
    match node {
        Some(Value::Table(table)) => table.keys().cloned().collect(),
        other => convert(
            key,
            other,
            default.iter().map(|s| (*s).to_string()).collect(),
        ),
    }
}

/// Read a non-negative number of seconds (integer or fractional)
pub(crate) fn convert_seconds(key: &str, node: Option<Value>, default: Duration) -> Duration {
    match node {
        None => default,
        Some(Value::Integer(secs)) if secs >= 0 => Duration::from_secs(secs.unsigned_abs()),
        Some(Value::Float(secs)) if secs.is_finite() && secs >= 0.0 => {
            Duration::from_secs_f64(secs)
        }
        Some(other) => {
            warn!(key, "Expected a number of seconds, got {}, using default", other.type_str());
            default
        }
    }
}
