//! Engine: configuration, registry and log sink for class definition
//!
//! Every class is defined against an [`Engine`]. The engine carries the
//! [`EngineConfig`], the [`MetadataRegistry`] annotation side effects are
//! written to, and the [`LogSink`](crate::LogSink) annotations print to.
//!
//! [`Engine::new`] uses the process-wide registry. [`Engine::isolated`]
//! gets a fresh one, which is what tests want.

use std::fmt;
use std::sync::Arc;

use crate::class::{Class, ClassBuilder};
use crate::compose;
use crate::config::EngineConfig;
use crate::error::DefinitionError;
use crate::metadata::{self, MetadataRegistry};
use crate::sink::{SharedSink, TracingSink};

/// Defines classes
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    registry: Arc<MetadataRegistry>,
    sink: SharedSink,
}

impl Engine {
    /// Engine on the process-wide registry, logging through `tracing`
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            registry: metadata::global(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Engine on a private, empty registry
    pub fn isolated() -> Self {
        Self::new().with_registry(MetadataRegistry::shared())
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the log sink
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the metadata registry
    pub fn with_registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Metadata registry
    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    /// Log sink
    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Define a class, applying every annotation in its body
    ///
    /// On error no class is produced. Registry writes made by annotations
    /// that ran before the failure are kept.
    pub fn define(&self, builder: ClassBuilder) -> Result<Arc<Class>, DefinitionError> {
        let name = builder.name.clone();
        let class = compose::define(self, builder).inspect_err(|e| {
            tracing::debug!("definition of {} failed: {}", name, e);
        })?;
        tracing::debug!(
            "defined class {} {} ({} declarations, {} conflicts)",
            class.name,
            class.id,
            class.declarations.len(),
            class.conflicts.len()
        );
        Ok(Arc::new(class))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
