//! # Outcome handler.
//!
//! Waits for a set of promises, then publishes exactly one rendered outcome to its
//! channel. The caller gets the loading placeholder right away.
//!
//! ## Flow
//! ```text
//! launch(promises)
//!   ├─ render_loading()                      ─► Frame { loading, channel_id, .. }
//!   └─ handle_promises(promises)
//!        ├─ empty list                       ─► no-op (nothing published)
//!        ├─ empty target                     ─► failure path on the caller thread
//!        └─ fan_in(promises).when_settled(..)
//!              ├─ Ok(values)  ─► success strategy ─► Succeeded ─► publish
//!              └─ Err(task)   ─► sink.report ─► failure strategy ─► Failed ─► publish
//! ```
//!
//! The settlement step runs inline when the executor is saturated or shut down, so
//! the outcome is published whatever the pool's policy.
//!
//! ## Rules
//! - Exactly one publish per handler with a non-empty promise list.
//! - The error sink sees each failure once, before the failure strategy runs.
//! - A panicking success strategy takes the failure path.
//! - A panicking failure strategy falls back to [`DEFAULT_FAILURE`](super::DEFAULT_FAILURE).
//! - Notifier errors and panics are logged and dropped.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::state::{FrameStatus, HandlerState};
use super::strategy::{DEFAULT_FAILURE, DEFAULT_LOADING, RenderStrategies, Rendered};
use crate::error::{HandlerError, SetupError, panic_message};
use crate::executor::{self, BoundedExecutor};
use crate::notify::{ChannelId, ErrorSink, LogSink, Notifier, ReportContext};
use crate::promise::{Promise, fan_in};

/// What [`OutcomeHandler::launch`] hands back to the caller.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Channel the outcome will be published to. Subscribe before the promises settle.
    pub channel_id: ChannelId,
    /// Placeholder region the outcome replaces.
    pub target: String,
    /// Loading payload to show until then.
    pub loading: Rendered,
    /// Live view of the handler state.
    pub status: FrameStatus,
}

/// Orchestrates a set of promises into a single out-of-band notification.
///
/// ## Example
/// ```rust
/// use framevisor::{BoundedExecutor, BroadcastNotifier, ExecutorConfig, OutcomeHandler, TaskError};
///
/// let exec = BoundedExecutor::new(ExecutorConfig::default());
/// let bus = BroadcastNotifier::default();
///
/// let handler = OutcomeHandler::new("stats", bus.clone())
///     .with_executor(exec.clone())
///     .on_success(|values: &[u32]| format!("total: {}", values.iter().sum::<u32>()));
/// let mut sub = bus.subscribe(handler.channel_id());
///
/// let promises = vec![
///     exec.submit(|| Ok::<_, TaskError>(1)).unwrap(),
///     exec.submit(|| Ok::<_, TaskError>(2)).unwrap(),
/// ];
/// let frame = handler.launch(promises);
/// assert_eq!(frame.loading.as_str(), "Loading...");
///
/// let published = sub.blocking_recv().unwrap();
/// assert_eq!(published.payload.as_str(), "total: 3");
/// ```
pub struct OutcomeHandler<T> {
    channel_id: ChannelId,
    target: String,
    strategies: RenderStrategies<T>,
    executor: Option<BoundedExecutor>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn ErrorSink>,
    status: FrameStatus,
}

impl<T: Clone + Send + 'static> OutcomeHandler<T> {
    /// Creates a handler for the `target` placeholder, publishing through `notifier`.
    ///
    /// Defaults: fresh random channel id, the process default executor,
    /// [`LogSink`], built-in payloads for every strategy.
    pub fn new(target: impl Into<String>, notifier: impl Notifier) -> Self {
        Self::with_shared_notifier(target, Arc::new(notifier))
    }

    /// Like [`new`](Self::new), for a notifier shared between handlers.
    pub fn with_shared_notifier(target: impl Into<String>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            channel_id: ChannelId::generate(),
            target: target.into(),
            strategies: RenderStrategies::default(),
            executor: None,
            notifier,
            sink: Arc::new(LogSink::new()),
            status: FrameStatus::new(),
        }
    }

    /// Runs continuations on `executor` instead of the process default.
    pub fn with_executor(mut self, executor: BoundedExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Reports failures to `sink` instead of [`LogSink`].
    pub fn with_error_sink(mut self, sink: impl ErrorSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Overrides the generated channel id.
    pub fn with_channel_id(mut self, channel_id: impl Into<ChannelId>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Registers the loading strategy.
    pub fn on_loading<F, R>(mut self, f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Into<Rendered>,
    {
        self.strategies.set_loading(f);
        self
    }

    /// Registers the success strategy; it receives the values in input order.
    pub fn on_success<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&[T]) -> R + Send + Sync + 'static,
        R: Into<Rendered>,
    {
        self.strategies.set_success(f);
        self
    }

    /// Registers the failure strategy.
    pub fn on_failure<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&HandlerError) -> R + Send + Sync + 'static,
        R: Into<Rendered>,
    {
        self.strategies.set_failure(f);
        self
    }

    /// Channel the outcome is published to.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Placeholder region the outcome replaces.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Live view of the handler state.
    pub fn status(&self) -> FrameStatus {
        self.status.clone()
    }

    /// Renders the loading placeholder and moves `Idle → Loading`.
    ///
    /// A panicking loading strategy yields [`DEFAULT_LOADING`].
    pub fn render_loading(&self) -> Rendered {
        self.status.start_loading();
        panic::catch_unwind(AssertUnwindSafe(|| self.strategies.render_loading())).unwrap_or_else(
            |payload| {
                warn!(
                    channel = %self.channel_id,
                    error = %panic_message(payload.as_ref()),
                    "loading strategy panicked; using default"
                );
                Rendered::from(DEFAULT_LOADING)
            },
        )
    }

    /// Waits for `promises` off the caller thread and publishes the outcome once.
    ///
    /// Returns immediately. An empty list publishes nothing. Setup failures are
    /// not raised; they take the failure path like a rejected promise.
    pub fn handle_promises(self, promises: Vec<Promise<T>>) -> FrameStatus {
        let status = self.status.clone();
        if promises.is_empty() {
            debug!(channel = %self.channel_id, "no promises to handle");
            return status;
        }

        let executor = self.executor.clone().unwrap_or_else(executor::global);
        let count = promises.len();
        let settlement = Arc::new(Settlement::from(self));

        if settlement.target.is_empty() {
            settlement.finish(Err(SetupError::EmptyTarget.into()));
            return status;
        }

        debug!(channel = %settlement.channel_id, count, "handling promises");
        fan_in(&executor, promises)
            .when_settled(move |outcome| settlement.finish(outcome.map_err(HandlerError::from)));
        status
    }

    /// Renders the loading placeholder, then hands `promises` to
    /// [`handle_promises`](Self::handle_promises).
    pub fn launch(self, promises: Vec<Promise<T>>) -> Frame {
        let loading = self.render_loading();
        let channel_id = self.channel_id.clone();
        let target = self.target.clone();
        let status = self.handle_promises(promises);
        Frame {
            channel_id,
            target,
            loading,
            status,
        }
    }
}

impl<T: 'static> fmt::Debug for OutcomeHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeHandler")
            .field("channel_id", &self.channel_id)
            .field("target", &self.target)
            .field("strategies", &self.strategies.registered())
            .field("state", &self.status.state())
            .finish_non_exhaustive()
    }
}

/// Everything the settlement continuation needs, detached from the builder.
struct Settlement<T> {
    channel_id: ChannelId,
    target: String,
    strategies: RenderStrategies<T>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn ErrorSink>,
    status: FrameStatus,
    claimed: AtomicBool,
}

impl<T> From<OutcomeHandler<T>> for Settlement<T> {
    fn from(h: OutcomeHandler<T>) -> Self {
        Self {
            channel_id: h.channel_id,
            target: h.target,
            strategies: h.strategies,
            notifier: h.notifier,
            sink: h.sink,
            status: h.status,
            claimed: AtomicBool::new(false),
        }
    }
}

impl<T: 'static> Settlement<T> {
    fn finish(&self, outcome: Result<Vec<T>, HandlerError>) {
        if self.claimed.swap(true, Ordering::AcqRel) {
            debug!(channel = %self.channel_id, "outcome already settled; ignoring");
            return;
        }

        let values = match outcome {
            Ok(values) => values,
            Err(e) => return self.fail(e),
        };
        match panic::catch_unwind(AssertUnwindSafe(|| self.strategies.render_success(&values))) {
            Ok(payload) => {
                self.status.finish(HandlerState::Succeeded);
                debug!(channel = %self.channel_id, count = values.len(), "promises fulfilled");
                self.publish(&payload);
            }
            Err(panic) => self.fail(HandlerError::Render {
                strategy: "success",
                error: panic_message(panic.as_ref()),
            }),
        }
    }

    fn fail(&self, error: HandlerError) {
        let ctx = ReportContext {
            channel_id: self.channel_id.clone(),
            target: self.target.clone(),
            handled: true,
            source: "outcome_handler",
        };
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| self.sink.report(&error, &ctx))) {
            warn!(
                channel = %self.channel_id,
                error = %panic_message(panic.as_ref()),
                "error sink panicked"
            );
        }

        let payload = panic::catch_unwind(AssertUnwindSafe(|| self.strategies.render_failure(&error)))
            .unwrap_or_else(|panic| {
                warn!(
                    channel = %self.channel_id,
                    error = %panic_message(panic.as_ref()),
                    "failure strategy panicked; using default"
                );
                Rendered::from(DEFAULT_FAILURE)
            });

        self.status.finish(HandlerState::Failed);
        debug!(channel = %self.channel_id, label = error.as_label(), "promises failed");
        self.publish(&payload);
    }

    fn publish(&self, payload: &Rendered) {
        let sent = panic::catch_unwind(AssertUnwindSafe(|| {
            self.notifier.publish(&self.channel_id, &self.target, payload)
        }));
        match sent {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(channel = %self.channel_id, error = %e, "failed to publish outcome"),
            Err(panic) => warn!(
                channel = %self.channel_id,
                error = %panic_message(panic.as_ref()),
                "notifier panicked"
            ),
        }
    }
}
