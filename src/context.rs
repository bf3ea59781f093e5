//! Execution context handed to pipeline stages.
//!
//! The context bundles the collaborators a stage may lean on: a leveled
//! logger, a mapper that turns untyped route configuration into typed models,
//! and an optional cache. It is passed explicitly to each stage.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::Cache;
use crate::environment::{RawConfiguration, ResolverConfiguration};

/// Leveled diagnostic sink. Side effects only.
///
/// Messages are built with `format_args!`, e.g.
/// `logger.debug(format_args!("configuration: {:?}", raw))`.
pub trait Logger: Send + Sync {
    fn info(&self, args: fmt::Arguments<'_>);
    fn debug(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// [`Logger`] that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "env_gateway::environment", "{}", args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "env_gateway::environment", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "env_gateway::environment", "{}", args);
    }
}

/// Converts untyped configuration tables into typed models.
pub trait ConfigMapper: Send + Sync {
    fn to_resolver_configuration(
        &self,
        raw: &RawConfiguration,
    ) -> Result<ResolverConfiguration, serde_json::Error>;
}

/// [`ConfigMapper`] backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMapper;

impl ConfigMapper for JsonMapper {
    fn to_resolver_configuration(
        &self,
        raw: &RawConfiguration,
    ) -> Result<ResolverConfiguration, serde_json::Error> {
        serde_json::from_value(Value::Object(raw.clone()))
    }
}

/// Per-request execution context.
#[derive(Clone)]
pub struct Context {
    logger: Arc<dyn Logger>,
    mapper: Arc<dyn ConfigMapper>,
    cache: Option<Arc<dyn Cache>>,
}

impl Context {
    pub fn new(logger: Arc<dyn Logger>, mapper: Arc<dyn ConfigMapper>) -> Self {
        Self {
            logger,
            mapper,
            cache: None,
        }
    }

    /// Attach a cache handle for stages that need one.
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn mapper(&self) -> &dyn ConfigMapper {
        self.mapper.as_ref()
    }

    pub fn cache(&self) -> Option<&Arc<dyn Cache>> {
        self.cache.as_ref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger), Arc::new(JsonMapper))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cache", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}
