//! Single config document bound to a file

use super::value::{convert, convert_list, convert_seconds};
use crate::constants::{DIR_MODE, INCLUDE_KEY};
use crate::error::{Result, TaspError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml::{Table, Value};
use tracing::{debug, error};

/// Hierarchical config document
///
/// Keys are dot-separated paths into nested tables. A `Config` with an
/// empty path is purely in-memory: `reload` keeps its values and `save`
/// has nowhere to write.
#[derive(Debug, Clone, Default)]
pub struct Config {
    path: PathBuf,
    document: Table,
}

impl Config {
    /// Empty in-memory document
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a document from `path`
    ///
    /// A missing or unreadable file yields an empty document and an error log.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let mut config = Self::new();
        config.set_path(path);
        config.reload();
        config
    }

    /// Parse an in-memory document
    pub fn parse(text: &str) -> Result<Self> {
        let document = toml::from_str(text).map_err(|e| TaspError::ConfigParse {
            path: PathBuf::new(),
            source: e,
        })?;
        Ok(Self {
            path: PathBuf::new(),
            document,
        })
    }

    /// Bind the document to a file, resolved to an absolute path
    pub fn set_path(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.path = fs::canonicalize(path)
            .or_else(|_| std::path::absolute(path))
            .unwrap_or_else(|_| path.to_path_buf());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the document holds no keys at all
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    // === Lookup ===

    /// Raw node at `key`, if every segment resolves through tables
    pub fn node(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let mut node = self.document.get(segments.next()?)?;
        for segment in segments {
            node = node.as_table()?.get(segment)?;
        }
        Some(node)
    }

    /// Typed value at `key`, or `default` when absent or of the wrong type
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        convert(key, self.node(key).cloned(), default)
    }

    /// List of names at `key`; a table yields its keys in document order
    pub fn get_list(&self, key: &str, default: &[&str]) -> Vec<String> {
        convert_list(key, self.node(key).cloned(), default)
    }

    /// Duration stored as a number of seconds
    pub fn get_seconds(&self, key: &str, default: Duration) -> Duration {
        convert_seconds(key, self.node(key).cloned(), default)
    }

    /// Store `value` at `key`, creating intermediate tables as needed
    ///
    /// Fails when an intermediate segment already holds a non-table value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let invalid = |reason: String| TaspError::ConfigValue {
            key: key.to_string(),
            reason,
        };

        let value = Value::try_from(value).map_err(|e| invalid(e.to_string()))?;

        let mut segments: Vec<&str> = key.split('.').collect();
        let last = segments
            .pop()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("empty key".into()))?;

        let mut table = &mut self.document;
        for segment in segments {
            let entry = table
                .entry(segment.to_string())
                .or_insert(Value::Table(Table::new()));
            table = match entry {
                Value::Table(child) => child,
                other => {
                    return Err(invalid(format!(
                        "'{}' holds a {}, not a table",
                        segment,
                        other.type_str()
                    )))
                }
            };
        }

        table.insert(last.to_string(), value);
        Ok(())
    }

    // === Persistence ===

    /// Re-read the bound file
    ///
    /// A missing file empties the document; a parse error keeps the
    /// previous values. An in-memory document is left untouched.
    pub fn reload(&mut self) {
        if self.path.as_os_str().is_empty() {
            return;
        }

        debug!("Loading config file {}", self.path.display());

        match read_document(&self.path) {
            Ok(document) => self.document = document,
            Err(e @ TaspError::Io { .. }) => {
                error!("Config file not loaded: {}", e);
                self.document = Table::new();
            }
            Err(e) => error!("{}, keeping previous values", e),
        }
    }

    /// Write the document to its file, creating the parent directory
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            create_dir(dir)?;
        }

        let text = toml::to_string_pretty(&self.document)
            .map_err(|e| TaspError::ConfigSerialize { source: e })?;
        fs::write(&self.path, text).map_err(|e| TaspError::io(&self.path, e))
    }

    /// Merge every file listed under `include` into this document
    ///
    /// Relative paths are resolved against this file's directory. Included
    /// files are processed recursively; keys already present here win over
    /// included ones, tables are merged key by key.
    pub fn include(&mut self) {
        let mut visited = HashSet::new();
        visited.insert(self.path.clone());
        self.include_from(&mut visited);
    }

    fn include_from(&mut self, visited: &mut HashSet<PathBuf>) {
        let base = self.path.parent().map(Path::to_path_buf).unwrap_or_default();
        let files: Vec<PathBuf> = self.get(INCLUDE_KEY, Vec::new());

        for file in files {
            let file = if file.is_absolute() {
                file
            } else {
                base.join(file)
            };

            let mut included = Self::from_file(&file);
            if !visited.insert(included.path.clone()) {
                debug!("Skipping already included config {}", file.display());
                continue;
            }
            if included.is_empty() {
                continue;
            }

            included.include_from(visited);
            merge_tables(&mut self.document, included.document);
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = toml::to_string_pretty(&self.document).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

fn read_document(path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path).map_err(|e| TaspError::io(path, e))?;
    toml::from_str(&text).map_err(|e| TaspError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Fold `source` into `dest`: missing keys are added, tables merge recursively
fn merge_tables(dest: &mut Table, source: Table) {
    for (key, value) in source {
        match (dest.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming)
            }
            (Some(_), _) => {}
            (None, value) => {
                dest.insert(key, value);
            }
        }
    }
}

/// Create a directory tree readable and writable by owner and group
pub(crate) fn create_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| TaspError::io(dir, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(DIR_MODE))
            .map_err(|e| TaspError::io(dir, e))?;
    }
    #[cfg(not(unix))]
    let _ = DIR_MODE;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
