//! CLI command implementations

pub mod metadata;
pub mod showcase;
pub mod watched;

use std::sync::Arc;

use adorn_engine::{Engine, SharedSink, TracingSink};

use crate::config::AdornConfig;

/// Engine on the process-wide registry, configured from adorn.toml
pub fn engine(config: &AdornConfig, sink: Option<SharedSink>) -> Engine {
    Engine::new()
        .with_config(config.engine.clone())
        .with_sink(sink.unwrap_or_else(|| Arc::new(TracingSink)))
}
