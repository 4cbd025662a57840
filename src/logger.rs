//! Caller-logging component
//!
//! [`CallerLogger`] is the operation surface the instrumentation host injects
//! calls to. Its single operation, [`CallerLogger::trace_log`], resolves the
//! identity of its immediate caller and emits one debug-level record through
//! a pluggable [`LogSink`]. Resolution failure degrades to the
//! [`MSG_NOT_FOUND`](crate::caller::MSG_NOT_FOUND) sentinel; the operation
//! itself never fails.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::caller::{self, ResolveStrategy, MSG_NOT_FOUND};
use crate::config::CalltraceConfig;

/// Component tag attached to every emitted record
pub const TAG: &str = "calltrace::CallerLogger";

/// Component version, reported in the initialization record
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Severity levels the component emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLevel {
    /// Construction-time diagnostics
    Verbose,
    /// Per-invocation caller records
    Debug,
}

/// Destination for emitted records
///
/// The production implementation forwards to the `tracing` facade; tests and
/// embedders can capture records with [`MemorySink`].
pub trait LogSink: Send + Sync {
    fn verbose(&self, tag: &str, message: &str);
    fn debug(&self, tag: &str, message: &str);
}

/// Sink that forwards records to the `tracing` facade
///
/// Subscriber installation is the embedder's concern; the self-check binary
/// installs `tracing-subscriber` on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn verbose(&self, tag: &str, message: &str) {
        tracing::trace!(tag = tag, "{}", message);
    }

    fn debug(&self, tag: &str, message: &str) {
        tracing::debug!(tag = tag, "{}", message);
    }
}

/// A record captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: SinkLevel,
    pub tag: String,
    pub message: String,
}

/// Sink that retains records in memory for inspection
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records captured so far
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Records at a given severity
    pub fn records_at(&self, level: SinkLevel) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    fn push(&self, level: SinkLevel, tag: &str, message: &str) {
        self.lock().push(LogRecord {
            level,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemorySink {
    fn verbose(&self, tag: &str, message: &str) {
        self.push(SinkLevel::Verbose, tag, message);
    }

    fn debug(&self, tag: &str, message: &str) {
        self.push(SinkLevel::Debug, tag, message);
    }
}

/// The injectable caller-logging component
///
/// Explicitly constructed: the composition root owns the instance and wires
/// the sink. A process-wide instance bound to the host's well-known name
/// lives in [`registry`](crate::registry).
pub struct CallerLogger {
    tag: String,
    strategy: ResolveStrategy,
    sink: Box<dyn LogSink>,
}

impl CallerLogger {
    /// Construct a logger and emit the verbose initialization record
    pub fn new(config: &CalltraceConfig, sink: Box<dyn LogSink>) -> Self {
        let logger = Self {
            tag: config.tag.clone().unwrap_or_else(|| TAG.to_string()),
            strategy: config.strategy(),
            sink,
        };
        logger
            .sink
            .verbose(&logger.tag, &format!("{} v{} initialized.", logger.tag, VERSION));
        logger
    }

    /// Log the identity of the immediate caller
    ///
    /// Emits exactly one debug record, `Caller -> <descriptor>`, substituting
    /// the sentinel when resolution fails. Never returns an error and never
    /// panics on a short stack.
    #[inline(never)]
    pub fn trace_log(&self) {
        let caller = match caller::resolve(self.strategy) {
            Some(descriptor) => descriptor.to_string(),
            None => MSG_NOT_FOUND.to_string(),
        };
        self.sink.debug(&self.tag, &format!("Caller -> {caller}"));
    }

    /// Tag attached to emitted records
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Strategy used to resolve callers
    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }
}

impl fmt::Debug for CallerLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerLogger")
            .field("tag", &self.tag)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
