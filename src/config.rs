//! # Executor configuration.
//!
//! Provides [`ExecutorConfig`], the centralized settings for a [`BoundedExecutor`](crate::BoundedExecutor),
//! and [`SaturationPolicy`], which decides what happens when its capacity is exhausted.
//!
//! Config is used in two ways:
//! 1. **Explicit executors**: `BoundedExecutor::new(config)`
//! 2. **Process default**: `executor::configure(|cfg| ...)` rebuilds the shared executor
//!
//! ## Sentinel values
//! - `max_workers = 0` → clamped to 1 (a pool always has at least one worker)
//! - `min_workers > max_workers` → clamped to `max_workers`
//! - `idle_timeout = 0s` → idle workers are never reclaimed

use std::time::Duration;

/// Behavior when every worker is busy and the queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaturationPolicy {
    /// Fail the submission immediately with [`SaturationError::Full`](crate::SaturationError::Full).
    Reject,
    /// Run the task synchronously on the submitting thread (default).
    #[default]
    RunInline,
    /// Block the submitting thread until capacity frees up.
    Block,
}

impl SaturationPolicy {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SaturationPolicy::Reject => "reject",
            SaturationPolicy::RunInline => "run_inline",
            SaturationPolicy::Block => "block",
        }
    }
}

/// Configuration for a bounded worker pool.
///
/// ## Field semantics
/// - `min_workers`: workers kept alive while idle (spawned lazily, never reclaimed)
/// - `max_workers`: ceiling on live workers (`0` is clamped to 1)
/// - `max_queue_depth`: tasks waiting for a worker once all workers are busy
/// - `policy`: what to do once `max_workers + max_queue_depth` tasks are in flight
/// - `idle_timeout`: how long a worker above `min_workers` idles before exiting (`0s` = never)
/// - `thread_name`: prefix for worker thread names
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Workers kept alive while idle.
    pub min_workers: usize,

    /// Maximum number of live workers.
    pub max_workers: usize,

    /// Maximum number of queued tasks beyond the busy workers.
    ///
    /// `0` means a task is only admitted when a worker can take it right away.
    pub max_queue_depth: usize,

    /// Saturation behavior.
    pub policy: SaturationPolicy,

    /// Idle time after which workers above `min_workers` exit.
    pub idle_timeout: Duration,

    /// Prefix for worker thread names (`{thread_name}-{n}`).
    pub thread_name: String,
}

impl ExecutorConfig {
    /// Returns the worker ceiling clamped to a minimum of 1.
    #[inline]
    pub fn max_workers_clamped(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Returns the worker floor, never above the ceiling.
    #[inline]
    pub fn min_workers_clamped(&self) -> usize {
        self.min_workers.min(self.max_workers_clamped())
    }

    /// Returns the total number of tasks that may be in flight (running + queued).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_workers_clamped()
            .saturating_add(self.max_queue_depth)
    }

    /// Returns the idle timeout as an `Option`.
    ///
    /// - `None` → idle workers are never reclaimed
    /// - `Some(d)` → workers above the floor exit after idling `d`
    #[inline]
    pub fn idle_reclaim(&self) -> Option<Duration> {
        if self.idle_timeout == Duration::ZERO {
            None
        } else {
            Some(self.idle_timeout)
        }
    }
}

impl Default for ExecutorConfig {
    /// Default configuration:
    ///
    /// - `min_workers = 1`
    /// - `max_workers = 5`
    /// - `max_queue_depth = 100`
    /// - `policy = SaturationPolicy::RunInline` (degrade instead of dropping work)
    /// - `idle_timeout = 60s`
    /// - `thread_name = "framevisor-worker"`
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 5,
            max_queue_depth: 100,
            policy: SaturationPolicy::default(),
            idle_timeout: Duration::from_secs(60),
            thread_name: "framevisor-worker".to_string(),
        }
    }
}
