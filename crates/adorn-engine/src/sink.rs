//! Log sinks
//!
//! Annotations write diagnostic text ("Component Decorator Called",
//! "=== begin log ===") through an injected [`LogSink`]. Writes happen
//! synchronously at the point the annotation runs, so their order mirrors
//! composition order.

use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for annotation output
pub trait LogSink: Send + Sync {
    /// Write one line
    fn write(&self, line: &str);
}

/// Shared sink handle
pub type SharedSink = Arc<dyn LogSink>;

/// Forwards every line to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, line: &str) {
        tracing::info!(target: "adorn::sink", "{}", line);
    }
}

/// Prints every line to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, line: &str) {
        println!("{}", line);
    }
}

/// Keeps every line in memory, in write order
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sink behind an `Arc`
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of the lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Drop all captured lines
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
