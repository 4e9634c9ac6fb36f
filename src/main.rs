//! tasp-daemon - minimal service built on the toolkit
//!
//! Usage:
//!   tasp-daemon                    Run with the default config search path
//!   tasp-daemon --config PATH      Run with an explicit config file
//!
//! Send SIGUSR1 or SIGUSR2 to reload, SIGINT/SIGTERM/SIGQUIT to stop.

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use tasp::{log_info, Daemon};

    let code = {
        let mut daemon = Daemon::new(std::env::args_os()).context("daemon startup failed")?;

        let logger = daemon.logger();
        let config = std::sync::Arc::clone(daemon.config());
        log_info!(logger, "config loaded from {}", config.path());

        let mut reloads: u64 = 0;
        daemon.on_reload(move || {
            reloads += 1;
            let sinks = config.get_list("logging.sinks", tasp::constants::DEFAULT_SINKS);
            log_info!(logger, "reload #{} done, sinks: {}", reloads, sinks);
        });

        daemon.exec()
    };

    // Daemon dropped above: pipeline drained, PID file released
    std::process::exit(code)
}

#[cfg(not(unix))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("tasp-daemon requires a unix platform")
}
