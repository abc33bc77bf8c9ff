//! # Error sinks.
//!
//! An [`ErrorSink`] is told about every handler failure once, before the failure
//! strategy renders. [`LogSink`] is the default and writes the error through `tracing`.

use tracing::error;

use super::ChannelId;
use crate::error::HandlerError;

/// Where a reported error came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportContext {
    /// Channel of the handler that failed.
    pub channel_id: ChannelId,
    /// Placeholder the failure render replaces.
    pub target: String,
    /// `true`: the error was turned into a failure render rather than propagated.
    pub handled: bool,
    /// Component reporting the error.
    pub source: &'static str,
}

/// Observability sink for unhandled errors.
pub trait ErrorSink: Send + Sync + 'static {
    /// Records `error`. Must not panic; called from executor workers.
    fn report(&self, error: &HandlerError, context: &ReportContext);
}

impl<F> ErrorSink for F
where
    F: Fn(&HandlerError, &ReportContext) + Send + Sync + 'static,
{
    fn report(&self, error: &HandlerError, context: &ReportContext) {
        self(error, context)
    }
}

/// Error sink that logs through `tracing` at `ERROR` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Construct a new [`LogSink`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ErrorSink for LogSink {
    fn report(&self, err: &HandlerError, ctx: &ReportContext) {
        error!(
            channel = %ctx.channel_id,
            dom_target = %ctx.target,
            handled = ctx.handled,
            source = ctx.source,
            label = err.as_label(),
            error = ?err,
            "{err}"
        );
    }
}
