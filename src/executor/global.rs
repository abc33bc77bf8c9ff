//! # Process-wide default executor.
//!
//! The default executor is built lazily from [`ExecutorConfig::default`] on first use,
//! can be replaced with [`configure`] / [`set_global`], and dropped with [`reset_global`]
//! (tests). Nothing in the crate reaches for it implicitly: handlers and combinators take
//! an executor explicitly, and [`global`] is just the usual thing to pass.
//!
//! ## Example
//! ```rust
//! use framevisor::{executor, SaturationPolicy};
//!
//! executor::configure(|cfg| {
//!     cfg.max_workers = 10;
//!     cfg.policy = SaturationPolicy::RunInline;
//! });
//! let answer = executor::execute(|| Ok(42)).unwrap();
//! assert_eq!(answer.wait(), Ok(42));
//! executor::reset_global();
//! ```

use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::pool::BoundedExecutor;
use crate::config::ExecutorConfig;
use crate::error::{SaturationError, TaskError};
use crate::promise::Promise;

static GLOBAL: RwLock<Option<BoundedExecutor>> = RwLock::new(None);

/// Returns the process default executor, building it on first use.
pub fn global() -> BoundedExecutor {
    if let Some(exec) = GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return exec.clone();
    }
    GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(|| BoundedExecutor::new(ExecutorConfig::default()))
        .clone()
}

/// Rebuilds the process default from a modified copy of its current configuration.
///
/// The previous default is shut down; work it already admitted still completes.
pub fn configure(f: impl FnOnce(&mut ExecutorConfig)) -> BoundedExecutor {
    let mut cfg = GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(|exec| exec.config().clone())
        .unwrap_or_default();
    f(&mut cfg);

    let exec = BoundedExecutor::new(cfg);
    set_global(exec.clone());
    exec
}

/// Installs `exec` as the process default, shutting down the previous one.
pub fn set_global(exec: BoundedExecutor) {
    let previous = GLOBAL
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(exec);
    if let Some(previous) = previous {
        debug!("replacing default executor");
        previous.shutdown();
    }
}

/// Drops the process default; the next [`global`] call builds a fresh one.
pub fn reset_global() {
    let previous = GLOBAL.write().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(previous) = previous {
        previous.shutdown();
    }
}

/// Submits `f` to the process default executor.
pub fn execute<T, F>(f: F) -> Result<Promise<T>, SaturationError>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> Result<T, TaskError> + Send + 'static,
{
    global().submit(f)
}
