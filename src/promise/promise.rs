//! # Settle-once promise with executor-dispatched continuations.
//!
//! A [`Promise`] is the read side, a [`Resolver`] the write side of one shared cell.
//!
//! ## State machine
//! ```text
//! Pending ──settle(Ok)──► Fulfilled(T)
//!    └─────settle(Err)──► Rejected(TaskError)
//! ```
//!
//! ## Rules
//! - The first `settle` wins; later attempts return `false` and change nothing.
//! - Observers registered while pending fire after settlement in registration order;
//!   observers registered afterwards fire immediately.
//! - `then` / `and_then` / `rescue` run their callback on the promise's executor,
//!   never on the thread that settled the upstream promise unless the executor is
//!   saturated or shut down, in which case they run inline rather than being dropped.
//! - When every resolver is dropped while pending, the promise rejects with
//!   [`TaskError::Abandoned`] so waiters never hang.

use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::error::TaskError;
use crate::executor::{BoundedExecutor, Job};

type Observer<T> = Box<dyn FnOnce(Result<T, TaskError>) + Send + 'static>;

enum State<T> {
    Pending(Vec<Observer<T>>),
    Settled(Result<T, TaskError>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
    settled: Condvar,
    resolvers: AtomicUsize,
}

impl<T: Clone + Send + 'static> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, outcome: Result<T, TaskError>) -> bool {
        let observers = {
            let mut st = self.lock();
            match &mut *st {
                State::Settled(_) => return false,
                State::Pending(observers) => {
                    let observers = mem::take(observers);
                    *st = State::Settled(outcome.clone());
                    observers
                }
            }
        };
        self.settled.notify_all();

        for observer in observers {
            observer(outcome.clone());
        }
        true
    }

    fn observe(&self, observer: Observer<T>) {
        let ready = {
            let mut st = self.lock();
            match &mut *st {
                State::Pending(observers) => {
                    observers.push(observer);
                    return;
                }
                State::Settled(outcome) => outcome.clone(),
            }
        };
        observer(ready);
    }
}

/// Handle to a value that becomes available exactly once, later, possibly as an error.
///
/// Cloning a promise clones the handle; all clones observe the same settlement.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
    executor: BoundedExecutor,
}

/// Write side of a [`Promise`].
///
/// Clones share the same cell. Only the first [`settle`](Resolver::settle) takes effect.
pub struct Resolver<T: Clone + Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Creates a pending promise and the resolver that settles it.
    ///
    /// Useful for bridging work that does not run on the executor (callbacks, channels).
    ///
    /// ```rust
    /// use framevisor::{BoundedExecutor, ExecutorConfig, Promise};
    ///
    /// let exec = BoundedExecutor::new(ExecutorConfig::default());
    /// let (resolver, promise) = Promise::resolvable(&exec);
    /// assert!(!promise.is_settled());
    ///
    /// assert!(resolver.fulfill("ready"));
    /// assert!(!resolver.fulfill("too late"));
    /// assert_eq!(promise.wait(), Ok("ready"));
    /// ```
    pub fn resolvable(executor: &BoundedExecutor) -> (Resolver<T>, Promise<T>) {
        Self::pending(executor.clone())
    }

    pub(crate) fn pending(executor: BoundedExecutor) -> (Resolver<T>, Promise<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::Pending(Vec::new())),
            settled: Condvar::new(),
            resolvers: AtomicUsize::new(1),
        });
        let resolver = Resolver {
            shared: Arc::clone(&shared),
        };
        (resolver, Promise { shared, executor })
    }

    /// Creates an already fulfilled promise.
    pub fn fulfilled(executor: &BoundedExecutor, value: T) -> Self {
        let (resolver, promise) = Self::resolvable(executor);
        resolver.fulfill(value);
        promise
    }

    /// Creates an already rejected promise.
    pub fn rejected(executor: &BoundedExecutor, error: TaskError) -> Self {
        let (resolver, promise) = Self::resolvable(executor);
        resolver.reject(error);
        promise
    }

    /// Returns the executor continuations of this promise run on.
    pub fn executor(&self) -> &BoundedExecutor {
        &self.executor
    }

    /// Returns `true` once the promise is fulfilled or rejected.
    pub fn is_settled(&self) -> bool {
        matches!(&*self.shared.lock(), State::Settled(_))
    }

    /// Returns the outcome without blocking, if settled.
    pub fn peek(&self) -> Option<Result<T, TaskError>> {
        match &*self.shared.lock() {
            State::Settled(outcome) => Some(outcome.clone()),
            State::Pending(_) => None,
        }
    }

    /// Blocks the calling thread until the promise settles.
    ///
    /// Meant for top-level orchestration; calling it from inside a task ties up a
    /// worker of the pool it may be waiting on.
    pub fn wait(&self) -> Result<T, TaskError> {
        let mut st = self.shared.lock();
        loop {
            if let State::Settled(outcome) = &*st {
                return outcome.clone();
            }
            st = self
                .shared
                .settled
                .wait(st)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Waits for settlement without blocking an async runtime thread.
    pub async fn settled(&self) -> Result<T, TaskError> {
        let (tx, rx) = oneshot::channel();
        self.observe(move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await.unwrap_or(Err(TaskError::Abandoned))
    }

    /// Chains `f` on success; a rejection passes through untouched.
    ///
    /// ```rust
    /// use framevisor::{BoundedExecutor, ExecutorConfig, TaskError};
    ///
    /// let exec = BoundedExecutor::new(ExecutorConfig::default());
    /// let len = exec
    ///     .submit(|| Ok::<_, TaskError>("hello".to_string()))
    ///     .unwrap()
    ///     .then(|s| s.len());
    /// assert_eq!(len.wait(), Ok(5));
    /// ```
    pub fn then<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.chain(move |outcome| outcome.map(f))
    }

    /// Chains a fallible `f` on success; its error rejects the downstream promise.
    pub fn and_then<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, TaskError> + Send + 'static,
    {
        self.chain(move |outcome| outcome.and_then(f))
    }

    /// Recovers from a rejection; a fulfilled value passes through untouched.
    pub fn rescue<F>(&self, f: F) -> Promise<T>
    where
        F: FnOnce(TaskError) -> T + Send + 'static,
    {
        self.chain(move |outcome| outcome.or_else(|e| Ok(f(e))))
    }

    /// Registers `observer` to run on the settling thread (or right away if settled).
    ///
    /// Observers must be cheap and must not block; anything heavier goes through
    /// [`when_settled`](Self::when_settled).
    pub(crate) fn observe<F>(&self, observer: F)
    where
        F: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        self.shared.observe(Box::new(observer));
    }

    /// Runs `run` on the executor once settled, or inline on the settling thread
    /// when the executor cannot take it.
    pub(crate) fn when_settled<F>(&self, run: F)
    where
        F: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        let executor = self.executor.clone();
        self.observe(move |outcome| {
            let job: Job = Box::new(move || run(outcome));
            executor.schedule(job);
        });
    }

    fn chain<U, F>(&self, step: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Result<T, TaskError>) -> Result<U, TaskError> + Send + 'static,
    {
        let (resolver, next) = Promise::pending(self.executor.clone());
        self.when_settled(move |outcome| {
            resolver.settle(catch_task(move || step(outcome)));
        });
        next
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            executor: self.executor.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.shared.lock() {
            State::Pending(_) => "pending",
            State::Settled(Ok(_)) => "fulfilled",
            State::Settled(Err(_)) => "rejected",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Settles the promise with `outcome`.
    ///
    /// Returns `false` if it was already settled (the call is a no-op).
    pub fn settle(&self, outcome: Result<T, TaskError>) -> bool {
        self.shared.settle(outcome)
    }

    /// Settles the promise as fulfilled.
    pub fn fulfill(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles the promise as rejected.
    pub fn reject(&self, error: TaskError) -> bool {
        self.settle(Err(error))
    }
}

impl<T: Clone + Send + 'static> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        self.shared.resolvers.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Resolver<T> {
    fn drop(&mut self) {
        if self.shared.resolvers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.settle(Err(TaskError::Abandoned));
        }
    }
}

/// Runs a task body, turning a panic into [`TaskError::Panicked`].
pub(crate) fn catch_task<T, F>(f: F) -> Result<T, TaskError>
where
    F: FnOnce() -> Result<T, TaskError>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)))
}
