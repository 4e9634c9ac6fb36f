//! Command-line interface definition using clap
//!
//! The toolkit recognizes a single flag, `--config <PATH>`. Everything else
//! on the command line belongs to the application built on top of it, so
//! parsing never fails: unknown arguments are skipped and a malformed
//! `--config` falls back to the default search path.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Arguments consumed by the daemon controller
#[derive(Parser, Debug, Default)]
#[command(name = "tasp-daemon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of the default search path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse the toolkit arguments out of a full argument list
    ///
    /// The first item is the program name, as with `std::env::args_os()`.
    /// Only `--config PATH` and `--config=PATH` are handed to clap, the rest
    /// is left for the application.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut own = vec![args.next().unwrap_or_else(|| OsString::from("tasp-daemon"))];

        while let Some(arg) = args.next() {
            let separate = arg.to_str() == Some("--config");
            let inline = arg.to_str().is_some_and(|s| s.starts_with("--config="));

            if separate {
                own.push(arg);
                own.extend(args.next());
            } else if inline {
                own.push(arg);
            }
        }

        Self::try_parse_from(own).unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::from_args(["tasp-daemon"]);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_config() {
        let cli = Cli::from_args(["tasp-daemon", "--config", "/etc/app.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/app.toml")));
    }

    #[test]
    fn test_cli_parse_config_equals_form() {
        let cli = Cli::from_args(["tasp-daemon", "--config=/tmp/a.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
    }

    #[test]
    fn test_cli_ignores_unknown_arguments() {
        let cli = Cli::from_args(["tasp-daemon", "--port", "9000", "--config", "b.toml", "-x"]);
        assert_eq!(cli.config, Some(PathBuf::from("b.toml")));
    }

    #[test]
    fn test_cli_empty_args() {
        let cli = Cli::from_args(Vec::<String>::new());
        assert!(cli.config.is_none());
    }
}
