//! Error types used by the framevisor executor, promises and outcome handlers.
//!
//! This module defines the error taxonomy:
//!
//! - [`TaskError`]: a unit of work (or a chain step) failed; settles a promise as rejected.
//! - [`SaturationError`]: the executor refused a submission; the only error a direct
//!   caller of [`BoundedExecutor::submit`](crate::BoundedExecutor::submit) ever sees.
//! - [`SetupError`]: the orchestration itself could not be wired up.
//! - [`HandlerError`]: what an outcome handler reports and hands to its failure strategy.
//! - [`NotifyError`]: a notifier could not deliver a payload (logged, never surfaced).
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced when the executor refuses work.
///
/// Raised synchronously by `submit` before any promise exists.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationError {
    /// Workers and queue are full and the policy is [`SaturationPolicy::Reject`](crate::SaturationPolicy::Reject).
    #[error("executor saturated: {max_workers} workers busy and queue depth {max_queue_depth} reached")]
    Full {
        /// Configured worker ceiling.
        max_workers: usize,
        /// Configured queue depth.
        max_queue_depth: usize,
    },

    /// The executor was shut down and accepts no more work.
    #[error("executor is shut down")]
    ShutDown,
}

impl SaturationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use framevisor::SaturationError;
    ///
    /// let err = SaturationError::Full { max_workers: 1, max_queue_depth: 0 };
    /// assert_eq!(err.as_label(), "executor_saturated");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SaturationError::Full { .. } => "executor_saturated",
            SaturationError::ShutDown => "executor_shut_down",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SaturationError::Full {
                max_workers,
                max_queue_depth,
            } => format!("saturated: workers={max_workers} queue={max_queue_depth}"),
            SaturationError::ShutDown => "shut down".to_string(),
        }
    }
}

/// # Errors produced by task execution.
///
/// Captured at the worker boundary and stored in the rejected promise; never
/// thrown across threads. Cheap to clone so every observer of a promise gets a copy.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The task (or a chain callback) panicked.
    #[error("task panicked: {error}")]
    Panicked {
        /// The panic payload, if it was a string.
        error: String,
    },

    /// Every resolver of the promise was dropped before it settled.
    #[error("promise abandoned before settlement")]
    Abandoned,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    ///
    /// ```
    /// use framevisor::TaskError;
    ///
    /// let err = TaskError::fail("db unavailable");
    /// assert_eq!(err.to_string(), "execution failed: db unavailable");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Abandoned => "task_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { error } => format!("panic: {error}"),
            TaskError::Abandoned => "abandoned".to_string(),
        }
    }

    /// Builds a [`TaskError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        TaskError::Panicked {
            error: panic_message(payload.as_ref()),
        }
    }
}

/// # Errors raised while wiring an outcome handler.
///
/// Caught at the `handle_promises` boundary and routed to the failure path.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The handler has no placeholder target to replace.
    #[error("handler target id is empty")]
    EmptyTarget,
}

impl SetupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SetupError::EmptyTarget => "setup_empty_target",
        }
    }
}

/// # Errors an outcome handler reports and renders.
///
/// Every variant takes the same path: one report to the error sink, then
/// the failure strategy, then one publish.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// One of the promises rejected (the lowest-index rejection).
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The orchestration could not be set up.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// A render strategy panicked.
    #[error("{strategy} strategy panicked: {error}")]
    Render {
        /// Name of the strategy (`"success"`).
        strategy: &'static str,
        /// The panic message.
        error: String,
    },
}

impl HandlerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// ```
    /// use framevisor::{HandlerError, TaskError};
    ///
    /// let err = HandlerError::from(TaskError::fail("boom"));
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Task(e) => e.as_label(),
            HandlerError::Setup(e) => e.as_label(),
            HandlerError::Render { .. } => "render_panicked",
        }
    }
}

/// # Errors produced by a notifier.
///
/// Logged by the handler and then dropped; delivery is fire-and-forget.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Nobody is listening on the transport.
    #[error("no subscribers for channel {channel}")]
    NoSubscribers {
        /// Channel the payload was addressed to.
        channel: String,
    },

    /// The transport failed.
    #[error("transport error: {error}")]
    Transport {
        /// The underlying error message.
        error: String,
    },
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
