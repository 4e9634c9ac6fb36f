//! Asynchronous multi-sink logging pipeline
//!
//! Producers render a `LogLine` on their own thread and append it to a
//! shared queue. One worker thread (a [`PeriodicTask`]) drains the queue into
//! every configured sink in FIFO order.
//!
//! - `print` only takes the queue mutex, it never wakes the worker
//! - the worker wakes on `logging.timeout`, `flush`, `reload` or shutdown
//! - drains and sink rebuilds both happen on the worker, never interleaved
//!
//! Dropping [`Logging`] requests stop and joins the worker after its final
//! drain, then the sinks are released.

use super::arg::LogArg;
use super::layer::mark_pipeline_thread;
use super::level::LogLevel;
use super::line::LogLine;
use super::sinks::{Sink, SinkContext, SinkFactory};
use crate::config::ConfigGlobal;
use crate::constants::{
    DEFAULT_LOG_TIMEOUT, DEFAULT_SINKS, LOG_WORKER_THREAD, MIN_LOG_TIMEOUT, SINKS_KEY,
};
use crate::error::Result;
use crate::task::{Periodic, PeriodicTask, TaskControl, TaskStatus};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct State {
    queue: VecDeque<LogLine>,
    sinks: Vec<Box<dyn Sink>>,
    /// Set by the final drain; later lines are refused
    closed: bool,
}

impl State {
    fn drain(&mut self) {
        let State { queue, sinks, .. } = self;
        for line in queue.drain(..) {
            for sink in sinks.iter_mut() {
                sink.print(&line);
            }
        }
        for sink in sinks.iter_mut() {
            sink.flush();
        }
    }
}

/// Cheap, cloneable producer handle
#[derive(Clone)]
pub struct Logger {
    state: Arc<Mutex<State>>,
    control: Arc<TaskControl>,
}

impl Logger {
    /// Queue a rendered line; dropped once the worker has made its final drain
    pub fn log(&self, line: LogLine) {
        let mut state = self.state.lock();
        if !state.closed {
            state.queue.push_back(line);
        }
    }

    /// Render and queue a line located at the caller
    #[track_caller]
    pub fn print(&self, level: LogLevel, format: &str, args: &[LogArg]) {
        self.log(LogLine::here(level, format, args));
    }

    /// Rebuild the sink set from the current configuration
    #[track_caller]
    pub fn reload(&self) {
        self.print(LogLevel::Info, "logging reload requested", &[]);
        self.control.change(TaskStatus::NeedReload);
    }

    /// Ask the worker to drain now
    pub fn flush(&self) {
        self.control.wake();
    }

    pub fn status(&self) -> TaskStatus {
        self.control.status()
    }

    /// Number of lines waiting for the worker
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

/// Owner of the logging worker
pub struct Logging {
    logger: Logger,
    _task: PeriodicTask,
}

impl Logging {
    /// Start the pipeline with the built-in sink types
    pub fn new(config: Arc<ConfigGlobal>) -> Result<Self> {
        Self::with_factory(config, SinkFactory::default())
    }

    /// Start the pipeline with a custom sink table
    pub fn with_factory(config: Arc<ConfigGlobal>, factory: SinkFactory) -> Result<Self> {
        let state = Arc::new(Mutex::new(State::default()));
        state
            .lock()
            .queue
            .push_back(LogLine::here(LogLevel::Info, "logging started", &[]));

        let worker = Worker {
            state: Arc::clone(&state),
            config,
            factory,
            interval: DEFAULT_LOG_TIMEOUT,
        };
        let task = PeriodicTask::spawn(LOG_WORKER_THREAD, worker)?;

        Ok(Self {
            logger: Logger {
                state,
                control: Arc::clone(task.control()),
            },
            _task: task,
        })
    }

    pub fn logger(&self) -> Logger {
        self.logger.clone()
    }
}

impl Deref for Logging {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

struct Worker {
    state: Arc<Mutex<State>>,
    config: Arc<ConfigGlobal>,
    factory: SinkFactory,
    interval: Duration,
}

impl Worker {
    fn build_sinks(&self) -> (Vec<Box<dyn Sink>>, Vec<LogLine>) {
        let mut sinks = Vec::new();
        let mut notices = Vec::new();

        for kind in self.config.get_list(SINKS_KEY, DEFAULT_SINKS) {
            let ctx = SinkContext::new(&self.config, &kind);
            if !ctx.enabled() {
                continue;
            }

            match self.factory.create(&kind, &ctx) {
                Some(Ok(sink)) => sinks.push(sink),
                Some(Err(e)) => notices.push(LogLine::here(
                    LogLevel::Error,
                    "cannot create {} sink: {}",
                    &[kind.as_str().into(), e.to_string().into()],
                )),
                None => debug!("Skipping unknown sink type {}", kind),
            }
        }

        (sinks, notices)
    }
}

impl Periodic for Worker {
    fn started(&mut self) {
        mark_pipeline_thread();
    }

    fn reload(&mut self) {
        // One syslog channel per process: close the old one before opening anew.
        let old = std::mem::take(&mut self.state.lock().sinks);
        drop(old);

        self.interval = self
            .config
            .get_seconds("logging.timeout", DEFAULT_LOG_TIMEOUT)
            .max(MIN_LOG_TIMEOUT);

        let (sinks, notices) = self.build_sinks();
        let mut state = self.state.lock();
        state.sinks = sinks;
        state.queue.extend(notices);
        state.drain();
    }

    fn run(&mut self) {
        self.state.lock().drain();
    }

    fn finish(&mut self) {
        let mut state = self.state.lock();
        state
            .queue
            .push_back(LogLine::here(LogLevel::Info, "logging stopped", &[]));
        state.drain();
        state.sinks.clear();
        state.closed = true;
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}

// =============================================================================
// Macros
// =============================================================================

/// Log through a [`Logger`] at an explicit level with `{}` placeholders
///
/// ```ignore
/// log_at!(logger, LogLevel::Info, "listening on {}", port);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $logger.log($crate::logging::LogLine::format(
            $level,
            file!(),
            line!(),
            $fmt,
            &[$($crate::logging::LogArg::from($arg)),*],
        ))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::LogLevel::Debug, $($rest)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::LogLevel::Info, $($rest)+)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::LogLevel::Warning, $($rest)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::LogLevel::Error, $($rest)+)
    };
}

#[macro_export]
macro_rules! log_none {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::LogLevel::None, $($rest)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::thread;
    use std::time::Instant;

    type Seen = Arc<Mutex<Vec<(String, LogLevel, String)>>>;

    /// Sink that records `(name, level, message)` into a shared list
    struct Memory {
        name: String,
        threshold: LogLevel,
        seen: Seen,
    }

    impl Sink for Memory {
        fn kind(&self) -> &str {
            "memory"
        }

        fn threshold(&self) -> LogLevel {
            self.threshold
        }

        fn write(&mut self, line: &LogLine) {
            self.seen
                .lock()
                .push((self.name.clone(), line.level, line.message.clone()));
        }
    }

    fn memory_factory(seen: &Seen) -> SinkFactory {
        let mut factory = SinkFactory::empty();
        for name in ["a", "b"] {
            let seen = Arc::clone(seen);
            factory.register(name, move |ctx| {
                Ok(Box::new(Memory {
                    name: name.to_string(),
                    threshold: ctx.threshold(),
                    seen: Arc::clone(&seen),
                }) as Box<dyn Sink>)
            });
        }
        factory
    }

    fn config(text: &str) -> Arc<ConfigGlobal> {
        Arc::new(ConfigGlobal::from_config(Config::parse(text).unwrap()))
    }

    fn messages(seen: &Seen, sink: &str) -> Vec<String> {
        seen.lock()
            .iter()
            .filter(|(name, _, _)| name == sink)
            .map(|(_, _, msg)| msg.clone())
            .collect()
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    const TWO_SINKS: &str = "[logging]\ntimeout = 60\n[logging.sinks.a]\n[logging.sinks.b]\n";

    #[test]
    fn test_start_and_stop_lines() {
        let seen = Seen::default();
        let logging = Logging::with_factory(config(TWO_SINKS), memory_factory(&seen)).unwrap();
        logging.print(LogLevel::Warning, "between", &[]);
        drop(logging);

        assert_eq!(
            messages(&seen, "a"),
            vec!["logging started", "between", "logging stopped"]
        );
        assert_eq!(messages(&seen, "a"), messages(&seen, "b"));
    }

    #[test]
    fn test_print_does_not_wake_but_flush_does() {
        let seen = Seen::default();
        let logging = Logging::with_factory(config(TWO_SINKS), memory_factory(&seen)).unwrap();
        wait_until(|| messages(&seen, "a").len() == 1);

        logging.print(LogLevel::Info, "queued {}", &[1.into()]);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(logging.pending(), 1);

        logging.flush();
        wait_until(|| messages(&seen, "a").contains(&"queued 1".to_string()));
        assert_eq!(logging.pending(), 0);
    }

    #[test]
    fn test_sink_thresholds_apply() {
        let seen = Seen::default();
        let text = "[logging]\ntimeout = 60\n\
                    [logging.sinks.a]\nlevel = \"Error\"\n\
                    [logging.sinks.b]\nlevel = \"Debug\"\n";
        let logging = Logging::with_factory(config(text), memory_factory(&seen)).unwrap();
        logging.print(LogLevel::Debug, "x", &[]);
        logging.print(LogLevel::Error, "y", &[]);
        drop(logging);

        assert_eq!(messages(&seen, "a"), vec!["y"]);
        assert_eq!(
            messages(&seen, "b"),
            vec!["logging started", "x", "y", "logging stopped"]
        );
    }

    #[test]
    fn test_disabled_and_unknown_sinks_are_skipped() {
        let seen = Seen::default();
        let text = "[logging]\ntimeout = 60\n\
                    [logging.sinks.a]\nenable = false\n\
                    [logging.sinks.b]\n\
                    [logging.sinks.smoke]\n";
        let logging = Logging::with_factory(config(text), memory_factory(&seen)).unwrap();
        drop(logging);

        assert!(messages(&seen, "a").is_empty());
        assert_eq!(messages(&seen, "b"), vec!["logging started", "logging stopped"]);
    }

    #[test]
    fn test_failing_constructor_is_reported() {
        let seen = Seen::default();
        let mut factory = memory_factory(&seen);
        factory.register("broken", |_| {
            Err(crate::error::TaspError::ConfigValue {
                key: "logging.sinks.broken".into(),
                reason: "no device".into(),
            })
        });
        let text = "[logging]\ntimeout = 60\n[logging.sinks.broken]\n[logging.sinks.a]\n";
        let logging = Logging::with_factory(config(text), factory).unwrap();
        drop(logging);

        let errors: Vec<_> = seen
            .lock()
            .iter()
            .filter(|(_, level, _)| *level == LogLevel::Error)
            .map(|(_, _, msg)| msg.clone())
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("cannot create broken sink: "));
    }

    #[test]
    fn test_reload_rebuilds_sinks() {
        let seen = Seen::default();
        let config = config("[logging]\ntimeout = 60\n[logging.sinks.a]\n");
        let logging = Logging::with_factory(Arc::clone(&config), memory_factory(&seen)).unwrap();
        logging.print(LogLevel::Info, "before", &[]);
        logging.flush();
        wait_until(|| messages(&seen, "a").contains(&"before".to_string()));

        config.set("logging.sinks.b.level", "Info");
        logging.reload();
        wait_until(|| {
            seen.lock()
                .iter()
                .any(|(_, _, msg)| msg == "logging reload requested")
        });
        logging.print(LogLevel::Info, "after", &[]);
        logging.flush();
        wait_until(|| messages(&seen, "b").contains(&"after".to_string()));
        drop(logging);

        assert!(!messages(&seen, "b").contains(&"before".to_string()));
        let a = messages(&seen, "a");
        assert!(a.contains(&"logging reload requested".to_string()));
        assert!(a.contains(&"after".to_string()));
    }

    #[test]
    fn test_print_after_stop_is_dropped() {
        let seen = Seen::default();
        let logging = Logging::with_factory(config(TWO_SINKS), memory_factory(&seen)).unwrap();
        let logger = logging.logger();
        drop(logging);

        assert_eq!(logger.status(), TaskStatus::Stop);
        logger.print(LogLevel::Error, "too late", &[]);
        assert_eq!(logger.pending(), 0);
        assert!(!messages(&seen, "a").contains(&"too late".to_string()));
    }

    #[test]
    fn test_immediate_drop_keeps_every_line() {
        for _ in 0..200 {
            let seen = Seen::default();
            let logging =
                Logging::with_factory(config(TWO_SINKS), memory_factory(&seen)).unwrap();
            logging.print(LogLevel::Error, "last words", &[]);
            drop(logging);

            let expected = vec!["logging started", "last words", "logging stopped"];
            assert_eq!(messages(&seen, "a"), expected);
            assert_eq!(messages(&seen, "b"), expected);
        }
    }

    #[test]
    fn test_reload_then_immediate_drop_keeps_every_line() {
        let seen = Seen::default();
        let logging = Logging::with_factory(config(TWO_SINKS), memory_factory(&seen)).unwrap();
        logging.reload();
        logging.print(LogLevel::Info, "after reload", &[]);
        drop(logging);

        let a = messages(&seen, "a");
        assert!(a.contains(&"after reload".to_string()));
        assert_eq!(a.last().map(String::as_str), Some("logging stopped"));
    }

    #[test]
    fn test_line_after_final_drain_is_refused() {
        let seen = Seen::default();
        let state = Arc::new(Mutex::new(State::default()));
        let logger = Logger {
            state: Arc::clone(&state),
            control: Arc::new(TaskControl::new()),
        };
        let mut worker = Worker {
            state,
            config: config(TWO_SINKS),
            factory: memory_factory(&seen),
            interval: DEFAULT_LOG_TIMEOUT,
        };

        worker.reload();
        worker.finish();
        // the status has not reached Stop yet
        assert_ne!(logger.status(), TaskStatus::Stop);
        logger.print(LogLevel::Error, "racing shutdown", &[]);
        assert_eq!(logger.pending(), 0);
        assert_eq!(messages(&seen, "a"), vec!["logging stopped"]);
    }

    #[test]
    fn test_macros_capture_call_site() {
        let seen = Seen::default();
        let logging = Logging::with_factory(config(TWO_SINKS), memory_factory(&seen)).unwrap();
        crate::log_warning!(logging, "disk {} at {}%", "/var", 93);
        crate::log_debug!(logging, "hidden");
        crate::log_error!(logging.logger(), "plain");
        drop(logging);

        let a = messages(&seen, "a");
        assert!(a.contains(&"disk /var at 93%".to_string()));
        assert!(a.contains(&"plain".to_string()));
        assert!(!a.contains(&"hidden".to_string()));
    }

    #[test]
    fn test_timeout_drives_drain() {
        let seen = Seen::default();
        let text = "[logging]\ntimeout = 0\n[logging.sinks.a]\n";
        let logging = Logging::with_factory(config(text), memory_factory(&seen)).unwrap();
        logging.print(LogLevel::Info, "tick", &[]);
        wait_until(|| messages(&seen, "a").contains(&"tick".to_string()));
    }
}
