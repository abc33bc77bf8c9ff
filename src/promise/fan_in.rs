//! # Fan-in combinators.
//!
//! [`fan_in`] collects N independent promises into one promise of their values in
//! **submission order**, and [`Promise::zip`] does the same for a heterogeneous pair.
//!
//! ## Policy: wait for all, report the earliest
//! ```text
//! inputs:   p0 ─┐   p1 ─┐   p2 ─┐          (settle in any real-time order)
//!               ▼       ▼       ▼
//! slots:   [ Ok(a) | Err(e1) | Err(e2) ]   remaining: 3 → 2 → 1 → 0
//!                                          ▼
//! combined: Rejected(e1)                   (lowest index wins, not first arrival)
//! ```
//! - The combined promise settles only after **every** input settled; a rejection does
//!   not short-circuit.
//! - With no rejection it fulfills with the values in input order.
//! - An empty input fulfills immediately with an empty `Vec`.
//!
//! Input observers only store their outcome and count down, so they run on whichever
//! thread settles the input. Continuations chained on the combined promise run on its
//! executor as usual.

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::promise::{Promise, Resolver};
use crate::error::TaskError;
use crate::executor::BoundedExecutor;

type Slot<T> = Option<Result<T, TaskError>>;

struct FanIn<T: Clone + Send + 'static> {
    slots: Mutex<Vec<Slot<T>>>,
    remaining: AtomicUsize,
    resolver: Resolver<Vec<T>>,
}

impl<T: Clone + Send + 'static> FanIn<T> {
    fn slots(&self) -> MutexGuard<'_, Vec<Slot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, index: usize, outcome: Result<T, TaskError>) {
        self.slots()[index] = Some(outcome);
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let slots = mem::take(&mut *self.slots());
            self.resolver.settle(collect(slots));
        }
    }
}

/// Takes the first rejection in index order, else every value in index order.
fn collect<T>(slots: Vec<Slot<T>>) -> Result<Vec<T>, TaskError> {
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(TaskError::Abandoned)))
        .collect()
}

/// Combines `promises` into one promise of all their values, in input order.
///
/// The combined promise continues on `executor`.
///
/// ## Example
/// ```rust
/// use std::{thread, time::Duration};
/// use framevisor::{fan_in, BoundedExecutor, ExecutorConfig, TaskError};
///
/// let exec = BoundedExecutor::new(ExecutorConfig::default());
/// let slow = exec.submit(|| { thread::sleep(Duration::from_millis(30)); Ok::<_, TaskError>("slow") }).unwrap();
/// let fast = exec.submit(|| Ok::<_, TaskError>("fast")).unwrap();
///
/// let all = fan_in(&exec, vec![slow, fast]);
/// assert_eq!(all.wait(), Ok(vec!["slow", "fast"]));
/// ```
pub fn fan_in<T>(executor: &BoundedExecutor, promises: Vec<Promise<T>>) -> Promise<Vec<T>>
where
    T: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::fulfilled(executor, Vec::new());
    }

    let (resolver, combined) = Promise::resolvable(executor);
    let state = Arc::new(FanIn {
        slots: Mutex::new((0..promises.len()).map(|_| None).collect()),
        remaining: AtomicUsize::new(promises.len()),
        resolver,
    });

    for (index, promise) in promises.iter().enumerate() {
        let state = Arc::clone(&state);
        promise.observe(move |outcome| state.record(index, outcome));
    }
    combined
}

struct Pair<T, U>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
{
    slots: Mutex<(Slot<T>, Slot<U>)>,
    remaining: AtomicUsize,
    resolver: Resolver<(T, U)>,
}

impl<T, U> Pair<T, U>
where
    T: Clone + Send + 'static,
    U: Clone + Send + 'static,
{
    fn slots(&self) -> MutexGuard<'_, (Slot<T>, Slot<U>)> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_down(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let (left, right) = mem::take(&mut *self.slots());
            let left = left.unwrap_or(Err(TaskError::Abandoned));
            let right = right.unwrap_or(Err(TaskError::Abandoned));
            self.resolver.settle(left.and_then(|l| right.map(|r| (l, r))));
        }
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Combines this promise with `other` under the same wait-for-all policy as [`fan_in`].
    ///
    /// If both reject, the error of `self` wins. The pair continues on `self`'s executor.
    pub fn zip<U>(&self, other: &Promise<U>) -> Promise<(T, U)>
    where
        U: Clone + Send + 'static,
    {
        let (resolver, combined) = Promise::resolvable(self.executor());
        let state = Arc::new(Pair {
            slots: Mutex::new((None, None)),
            remaining: AtomicUsize::new(2),
            resolver,
        });

        let left = Arc::clone(&state);
        self.observe(move |outcome| {
            left.slots().0 = Some(outcome);
            left.count_down();
        });
        let right = state;
        other.observe(move |outcome| {
            right.slots().1 = Some(outcome);
            right.count_down();
        });
        combined
    }
}
