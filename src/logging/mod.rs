//! Unified logging system
//!
//! - `LogLevel` / `LogArg` / `LogLine` - what a log call produces
//! - `sinks` - console, file (with rotation) and syslog destinations
//! - `Logging` / `Logger` - the queue and worker thread feeding the sinks
//! - `PipelineLayer` - routes `tracing` events into the same pipeline

pub mod arg;
pub mod layer;
pub mod level;
pub mod line;
pub mod pipeline;
pub mod sinks;

pub use arg::{format_message, LogArg};
pub use layer::{init_tracing, PipelineLayer};
pub use level::LogLevel;
pub use line::LogLine;
pub use pipeline::{Logger, Logging};
pub use sinks::{Sink, SinkContext, SinkFactory};
