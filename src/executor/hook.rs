//! # Context propagation hooks.
//!
//! A [`ContextHook`] wraps every job right before it is handed to the pool, on the
//! submitting thread. The wrapped job runs on a worker (or inline), so the hook is the
//! place to capture ambient request-scoped state and re-install it around the job.
//!
//! ## Rules
//! - `wrap` must return a job that calls the given job **exactly once**.
//! - Each call to `wrap` must build a fresh scope; wrapped jobs run concurrently on
//!   different workers and must not share mutable ambient state.
//! - No hook means the job runs unwrapped.
//!
//! ## Example
//! ```rust
//! use framevisor::{BoundedExecutor, ExecutorConfig, Job};
//!
//! let exec = BoundedExecutor::builder(ExecutorConfig::default())
//!     .hook(|job: Job| -> Job {
//!         Box::new(move || {
//!             // checkout per-task resources here
//!             job();
//!             // and release them here
//!         })
//!     })
//!     .build();
//! # exec.shutdown();
//! ```

/// A type-erased unit of work as seen by the pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Wraps jobs with ambient context before they reach a worker.
pub trait ContextHook: Send + Sync + 'static {
    /// Returns a job that runs `job` inside the captured context.
    fn wrap(&self, job: Job) -> Job;
}

impl<F> ContextHook for F
where
    F: Fn(Job) -> Job + Send + Sync + 'static,
{
    fn wrap(&self, job: Job) -> Job {
        self(job)
    }
}

/// Carries the submitter's current [`tracing::Span`] into the worker.
///
/// The span is captured when the job is submitted and entered for the duration of
/// the job only, so events emitted by the task are attributed to the request that
/// launched it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpanPropagation;

impl ContextHook for SpanPropagation {
    fn wrap(&self, job: Job) -> Job {
        let span = tracing::Span::current();
        Box::new(move || span.in_scope(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_hook_runs_job_once() {
        let before = Arc::new(AtomicUsize::new(0));
        let hook = {
            let before = Arc::clone(&before);
            move |job: Job| -> Job {
                let before = Arc::clone(&before);
                Box::new(move || {
                    before.fetch_add(1, Ordering::SeqCst);
                    job();
                })
            }
        };

        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        let wrapped = hook.wrap(Box::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        wrapped();

        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_span_propagation_runs_job() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        let wrapped = SpanPropagation.wrap(Box::new(move || {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        std::thread::spawn(wrapped).join().unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
