//! # Out-of-band delivery: notifiers and error sinks.
//!
//! The outcome handler talks to two external collaborators:
//!
//! - [`Notifier`] publishes the final rendered payload to a channel (fire-and-forget);
//! - [`ErrorSink`] receives every handler failure exactly once, before the failure render.
//!
//! Built-ins:
//! - [`BroadcastNotifier`] in-memory transport over `tokio::sync::broadcast`
//!   (subscribers filter by [`ChannelId`]);
//! - [`LogSink`] reports errors through `tracing`.
//!
//! ## Flow
//! ```text
//! OutcomeHandler ── publish(channel, target, payload) ──► Notifier ──► subscribers of `channel`
//!        └──────── report(error, context) ──────────────► ErrorSink
//! ```

mod bus;
mod channel;
mod sink;

pub use bus::{BroadcastNotifier, Notification, Subscription};
pub use channel::ChannelId;
pub use sink::{ErrorSink, LogSink, ReportContext};

use crate::error::NotifyError;
use crate::handler::Rendered;

/// Publish-by-channel primitive used to deliver the final rendered payload.
///
/// Called from executor workers. Errors are logged by the caller and dropped;
/// wrap the notifier if delivery must be retried.
pub trait Notifier: Send + Sync + 'static {
    /// Publishes `payload` to subscribers of `channel`, replacing `target`.
    fn publish(&self, channel: &ChannelId, target: &str, payload: &Rendered) -> Result<(), NotifyError>;
}

impl<F> Notifier for F
where
    F: Fn(&ChannelId, &str, &Rendered) -> Result<(), NotifyError> + Send + Sync + 'static,
{
    fn publish(&self, channel: &ChannelId, target: &str, payload: &Rendered) -> Result<(), NotifyError> {
        self(channel, target, payload)
    }
}
