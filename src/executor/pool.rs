//! # Bounded worker pool.
//!
//! [`BoundedExecutor`] runs closures on at most `max_workers` OS threads, queues up to
//! `max_queue_depth` more, and applies a [`SaturationPolicy`] beyond that.
//!
//! ## Architecture
//! ```text
//! submit(f) ──► hook.wrap(job) ──► admit ──► [queue] ──► worker 1 ─► job() ─► resolver.settle
//!                                    │                ├─► worker 2
//!                                    │                └─► worker N (N <= max_workers)
//!                                    └─► saturated: reject | run inline | block
//! ```
//!
//! ## Rules
//! - All pool state lives behind one mutex; callers never lock anything themselves.
//! - Workers spawn lazily; workers above `min_workers` exit after `idle_timeout`.
//! - A panic inside a job is caught on the worker; the worker keeps serving.
//! - After [`BoundedExecutor::shutdown`] nothing is admitted, queued work still drains.
//! - Continuations are never refused; a saturated or shut down pool runs them on the caller.
//! - Dropping the last handle shuts the pool down; in-flight work keeps it alive until drained.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::builder::ExecutorBuilder;
use super::hook::{ContextHook, Job};
use crate::config::{ExecutorConfig, SaturationPolicy};
use crate::error::{SaturationError, TaskError, panic_message};
use crate::promise::{Promise, catch_task};

/// Cheap-to-clone handle over a shared bounded pool.
///
/// ## Example
/// ```rust
/// use framevisor::{BoundedExecutor, ExecutorConfig, TaskError};
///
/// let exec = BoundedExecutor::new(ExecutorConfig::default());
/// let answer = exec.submit(|| Ok::<_, TaskError>(6 * 7)).unwrap();
/// assert_eq!(answer.wait(), Ok(42));
/// exec.shutdown();
/// ```
#[derive(Clone)]
pub struct BoundedExecutor {
    inner: Arc<Inner>,
    owner: Arc<Owner>,
}

/// Shared by every handle but never by workers; its drop shuts the pool down.
struct Owner(Arc<Inner>);

impl Drop for Owner {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

/// Result of [`BoundedExecutor::admit`].
enum Admission {
    Queued,
    Inline(Job),
    Refused(SaturationError, Job),
}

struct Inner {
    cfg: ExecutorConfig,
    hook: Option<Arc<dyn ContextHook>>,
    state: Mutex<PoolState>,
    /// Signalled when a job is queued or on shutdown.
    work_ready: Condvar,
    /// Signalled when a worker finishes a job or on shutdown.
    space_ready: Condvar,
    /// Signalled when the last worker exits after shutdown.
    terminated: Condvar,
}

#[derive(Default)]
struct PoolState {
    queue: VecDeque<Job>,
    live: usize,
    busy: usize,
    spawned: u64,
    shutdown: bool,
}

/// Point-in-time view of the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Worker threads currently alive.
    pub live: usize,
    /// Workers currently running a job.
    pub busy: usize,
    /// Jobs waiting for a worker.
    pub queued: usize,
}

impl BoundedExecutor {
    /// Creates an executor without a context hook.
    pub fn new(cfg: ExecutorConfig) -> Self {
        Self::from_parts(cfg, None)
    }

    /// Creates an executor that wraps every job with `hook`.
    pub fn with_hook(cfg: ExecutorConfig, hook: impl ContextHook) -> Self {
        Self::from_parts(cfg, Some(Arc::new(hook)))
    }

    /// Returns a builder for an executor with optional parts.
    pub fn builder(cfg: ExecutorConfig) -> ExecutorBuilder {
        ExecutorBuilder::new(cfg)
    }

    pub(super) fn from_parts(cfg: ExecutorConfig, hook: Option<Arc<dyn ContextHook>>) -> Self {
        let inner = Arc::new(Inner {
            cfg,
            hook,
            state: Mutex::new(PoolState::default()),
            work_ready: Condvar::new(),
            space_ready: Condvar::new(),
            terminated: Condvar::new(),
        });
        Self {
            owner: Arc::new(Owner(Arc::clone(&inner))),
            inner,
        }
    }

    /// Returns the configuration this executor was built with.
    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.cfg
    }

    /// Submits `f` for execution and returns a promise of its result.
    ///
    /// ### Errors
    /// - [`SaturationError::Full`] when saturated under [`SaturationPolicy::Reject`]
    /// - [`SaturationError::ShutDown`] after [`shutdown`](Self::shutdown), under every policy
    ///
    /// Under [`SaturationPolicy::RunInline`] a saturated submission runs `f` on the
    /// calling thread and the returned promise is already settled.
    pub fn submit<T, F>(&self, f: F) -> Result<Promise<T>, SaturationError>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let (resolver, promise) = Promise::pending(self.clone());
        let job = self.wrap(Box::new(move || {
            resolver.settle(catch_task(f));
        }));

        match self.admit(job, self.inner.cfg.policy) {
            Admission::Queued => {}
            Admission::Inline(job) => run_job(job, "inline"),
            Admission::Refused(e, _) => return Err(e),
        }
        Ok(promise)
    }

    /// Schedules a chain step (continuation) on the pool.
    ///
    /// Never refuses and never blocks: when the pool is saturated or shut down the
    /// step runs on the calling thread, which is usually a worker of this very pool
    /// that still counts itself as busy.
    pub(crate) fn schedule(&self, job: Job) {
        let job = self.wrap(job);
        match self.admit(job, SaturationPolicy::RunInline) {
            Admission::Queued => {}
            Admission::Inline(job) | Admission::Refused(_, job) => run_job(job, "inline"),
        }
    }

    /// Stops admitting work. Queued jobs still run; idle workers exit.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) was called.
    pub fn is_shutdown(&self) -> bool {
        self.inner.lock().shutdown
    }

    /// Blocks until every worker exited after shutdown, or `timeout` elapsed.
    ///
    /// Returns `false` on timeout or when the executor was never shut down.
    pub fn wait_for_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.inner.lock();
        loop {
            if st.shutdown && st.live == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .terminated
                .wait_timeout(st, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            st = guard;
        }
    }

    /// Returns a snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        let st = self.inner.lock();
        PoolStats {
            live: st.live,
            busy: st.busy,
            queued: st.queue.len(),
        }
    }

    fn wrap(&self, job: Job) -> Job {
        match &self.inner.hook {
            Some(hook) => hook.wrap(job),
            None => job,
        }
    }

    /// Admits `job` into the queue, or hands it back to run inline or to be refused.
    fn admit(&self, job: Job, policy: SaturationPolicy) -> Admission {
        let inner = &self.inner;
        let capacity = inner.cfg.capacity();
        let max_workers = inner.cfg.max_workers_clamped();

        let mut st = inner.lock();
        loop {
            if st.shutdown {
                return Admission::Refused(SaturationError::ShutDown, job);
            }
            if st.busy + st.queue.len() < capacity {
                break;
            }
            match policy {
                SaturationPolicy::Reject => {
                    warn!(
                        busy = st.busy,
                        queued = st.queue.len(),
                        "executor saturated; rejecting submission"
                    );
                    let err = SaturationError::Full {
                        max_workers,
                        max_queue_depth: inner.cfg.max_queue_depth,
                    };
                    return Admission::Refused(err, job);
                }
                SaturationPolicy::RunInline => {
                    debug!(
                        busy = st.busy,
                        queued = st.queue.len(),
                        "executor saturated; running on caller"
                    );
                    return Admission::Inline(job);
                }
                SaturationPolicy::Block => {
                    st = inner
                        .space_ready
                        .wait(st)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }

        if st.live < max_workers && st.busy + st.queue.len() >= st.live {
            if let Err(e) = self.spawn_worker(&mut st) {
                warn!(error = %e, live = st.live, "failed to spawn worker");
                if st.live == 0 {
                    return Admission::Inline(job);
                }
            }
        }

        st.queue.push_back(job);
        drop(st);
        inner.work_ready.notify_one();
        Admission::Queued
    }

    fn spawn_worker(&self, st: &mut PoolState) -> std::io::Result<()> {
        let id = st.spawned + 1;
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name(format!("{}-{id}", self.inner.cfg.thread_name))
            .spawn(move || worker_loop(inner, id))?;
        st.spawned = id;
        st.live += 1;
        Ok(())
    }
}

impl fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("cfg", &self.inner.cfg)
            .field("hook", &self.inner.hook.is_some())
            .field("handles", &Arc::strong_count(&self.owner))
            .field("stats", &self.stats())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn shutdown(&self) {
        let mut st = self.lock();
        if st.shutdown {
            return;
        }
        st.shutdown = true;
        let (idle_exit, queued) = (st.live == 0, st.queue.len());
        drop(st);

        debug!(queued, "executor shutting down");
        self.work_ready.notify_all();
        self.space_ready.notify_all();
        if idle_exit {
            self.terminated.notify_all();
        }
    }
}

/// Worker body: drain the queue, idle on the condvar, exit on shutdown or reclaim.
fn worker_loop(inner: Arc<Inner>, id: u64) {
    debug!(worker = id, "worker started");
    let floor = inner.cfg.min_workers_clamped();

    let mut st = inner.lock();
    loop {
        if let Some(job) = st.queue.pop_front() {
            st.busy += 1;
            drop(st);

            run_job(job, "worker");

            st = inner.lock();
            st.busy -= 1;
            inner.space_ready.notify_one();
            continue;
        }
        if st.shutdown {
            break;
        }
        match inner.cfg.idle_reclaim() {
            Some(idle) if st.live > floor => {
                let (guard, res) = inner
                    .work_ready
                    .wait_timeout(st, idle)
                    .unwrap_or_else(PoisonError::into_inner);
                st = guard;
                if res.timed_out() && st.queue.is_empty() && !st.shutdown && st.live > floor {
                    debug!(worker = id, "idle worker reclaimed");
                    break;
                }
            }
            _ => {
                st = inner
                    .work_ready
                    .wait(st)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }

    st.live -= 1;
    let last = st.live == 0 && st.shutdown;
    drop(st);
    if last {
        inner.terminated.notify_all();
    }
    debug!(worker = id, "worker exited");
}

/// Runs one job, isolating panics that escape it (e.g. from a context hook).
fn run_job(job: Job, place: &'static str) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        warn!(
            place,
            panic = %panic_message(payload.as_ref()),
            "job panicked outside of its task"
        );
    }
}
