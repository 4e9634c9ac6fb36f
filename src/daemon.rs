//! Daemon lifecycle controller
//!
//! Startup order:
//! 1. block the handled signals (before any thread exists)
//! 2. load the global config
//! 3. start the logging pipeline and route `tracing` into it
//! 4. install the SIGSEGV handler
//! 5. take the PID file
//!
//! [`Daemon::exec`] then waits for signals: SIGUSR1/SIGUSR2 reload config,
//! logging and the application callback; the others end the loop.

use crate::cli::Cli;
use crate::config::ConfigGlobal;
use crate::constants::{EXIT_FAILURE, EXIT_OK, EXIT_SECOND_LAUNCH};
use crate::crash;
use crate::error::Result;
use crate::logging::{init_tracing, Logger, Logging};
use crate::pid::PidGuard;
use crate::signals::{self, SignalAction};
use crate::{log_error, log_info};
use nix::sys::signal::SigSet;
use std::ffi::OsString;
use std::sync::Arc;

type ReloadCallback = Box<dyn FnMut() + Send>;

/// Process lifecycle: config, logging, PID file and the signal loop
///
/// Fields drop in declaration order, so the PID file is released while the
/// pipeline still runs and the config outlives both.
pub struct Daemon {
    callback: Option<ReloadCallback>,
    pid: PidGuard,
    logging: Logging,
    config: Arc<ConfigGlobal>,
    signals: SigSet,
}

impl Daemon {
    /// Start from command-line arguments (program name first)
    pub fn new<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let cli = Cli::from_args(args);
        let signals = signals::block()?;
        let config = ConfigGlobal::load(cli.config.as_deref());
        Self::start(config, signals)
    }

    /// Start from an already loaded config
    ///
    /// Must be called before the calling thread spawns other threads that
    /// should inherit the signal mask.
    pub fn with_config(config: ConfigGlobal) -> Result<Self> {
        let signals = signals::block()?;
        Self::start(config, signals)
    }

    fn start(config: ConfigGlobal, signals: SigSet) -> Result<Self> {
        let config = Arc::new(config);
        let logging = Logging::new(Arc::clone(&config))?;
        init_tracing(logging.logger());

        if let Err(e) = crash::install(&config.program_name()) {
            log_error!(logging, "crash handler not installed: {}", e.to_string());
        }

        let pid = PidGuard::new(&config);

        Ok(Self {
            callback: None,
            pid,
            logging,
            config,
            signals,
        })
    }

    /// Register the callback run after every config and logging reload
    pub fn on_reload<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub fn config(&self) -> &Arc<ConfigGlobal> {
        &self.config
    }

    pub fn logger(&self) -> Logger {
        self.logging.logger()
    }

    pub fn pid(&self) -> &PidGuard {
        &self.pid
    }

    /// Run the signal loop, returns the process exit code
    pub fn exec(&mut self) -> i32 {
        if self.pid.second_launch() {
            log_error!(
                self.logging,
                "another instance is already running with pid {}",
                self.pid.running()
            );
            return EXIT_SECOND_LAUNCH;
        }

        log_info!(self.logging, "daemon running with pid {}", self.pid.current());

        loop {
            let signal = match signals::wait(&self.signals) {
                Ok(signal) => signal,
                Err(e) => {
                    log_error!(self.logging, "{}", e.to_string());
                    return EXIT_FAILURE;
                }
            };

            log_info!(
                self.logging,
                "received signal {}: {}",
                signal as i32,
                signals::describe(signal)
            );

            match signals::action(signal) {
                SignalAction::Reload => self.reload(),
                SignalAction::Terminate => return EXIT_OK,
            }
        }
    }

    fn reload(&mut self) {
        self.config.reload();
        self.logging.reload();
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }
}
