use std::sync::Arc;

use super::hook::ContextHook;
use super::pool::BoundedExecutor;
use crate::config::ExecutorConfig;

/// Builder for constructing a [`BoundedExecutor`] with optional parts.
pub struct ExecutorBuilder {
    cfg: ExecutorConfig,
    hook: Option<Arc<dyn ContextHook>>,
}

impl ExecutorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ExecutorConfig) -> Self {
        Self { cfg, hook: None }
    }

    /// Sets the context hook applied to every submitted job and continuation.
    pub fn hook(mut self, hook: impl ContextHook) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Sets an already shared context hook.
    pub fn shared_hook(mut self, hook: Arc<dyn ContextHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Builds the executor. Workers are spawned lazily on first submission.
    pub fn build(self) -> BoundedExecutor {
        BoundedExecutor::from_parts(self.cfg, self.hook)
    }
}
