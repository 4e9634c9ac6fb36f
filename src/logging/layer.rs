//! Bridge from `tracing` events into the pipeline
//!
//! The crate's own diagnostics use the `tracing` macros. `PipelineLayer`
//! turns each event into a `LogLine` so those diagnostics reach the same
//! sinks as application output. Events raised on the pipeline worker are
//! skipped: the worker may hold the queue mutex while a sink reports a
//! failure.

use super::level::LogLevel;
use super::line::LogLine;
use super::pipeline::Logger;
use std::cell::Cell;
use std::fmt::Write as _;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

thread_local! {
    static PIPELINE_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Flag the current thread as the pipeline worker
pub(crate) fn mark_pipeline_thread() {
    PIPELINE_THREAD.with(|flag| flag.set(true));
}

fn on_pipeline_thread() -> bool {
    PIPELINE_THREAD.with(Cell::get)
}

/// Map a tracing level onto the pipeline's levels (trace folds into debug)
pub fn level_of(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warning,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

/// A tracing Layer that forwards events to a [`Logger`]
pub struct PipelineLayer {
    logger: Logger,
}

impl PipelineLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for PipelineLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if on_pipeline_thread() {
            return;
        }

        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.logger.log(LogLine::new(
            level_of(metadata.level()),
            metadata.file().unwrap_or_else(|| metadata.target()),
            metadata.line().unwrap_or(0),
            visitor.finish(),
        ));
    }
}

/// Collects `message` plus any extra fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, field: &Field, value: &dyn std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field, &format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field, &value);
        }
    }
}

/// Install the global tracing subscriber
///
/// - compact `fmt` output on stderr for warnings and errors
/// - [`PipelineLayer`] filtered by `RUST_LOG` (default `info`)
///
/// A subscriber that is already installed is kept.
pub fn init_tracing(logger: Logger) {
    use tracing_subscriber::filter::{EnvFilter, LevelFilter};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let pipeline_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact()
                .with_filter(LevelFilter::WARN),
        )
        .with(PipelineLayer::new(logger).with_filter(pipeline_filter))
        .try_init();
}
