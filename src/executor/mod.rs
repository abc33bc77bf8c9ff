//! Bounded worker pool: submission, saturation and context propagation.
//!
//! ## Contents
//! - [`BoundedExecutor`] fixed-ceiling pool of OS worker threads with a bounded queue
//! - [`ExecutorBuilder`] builder for attaching a [`ContextHook`]
//! - [`ContextHook`] / [`SpanPropagation`] per-task wrapping of ambient state
//! - [`global`] / [`configure`] / [`execute`] the lazily-built, resettable process default
//!
//! ## Admission
//! ```text
//! submit(f)
//!   ├─ shut down?                         ─► Err(SaturationError::ShutDown)
//!   ├─ busy + queued < capacity           ─► enqueue (spawn a worker if live < max)
//!   └─ saturated:
//!        ├─ SaturationPolicy::Reject      ─► Err(SaturationError::Full)
//!        ├─ SaturationPolicy::RunInline   ─► run f on the caller, return settled promise
//!        └─ SaturationPolicy::Block       ─► wait for space, then enqueue
//! ```
//!
//! Chain steps (`then`, `rescue`, handler settlement) skip the policy: when they do not
//! fit they run on the settling thread, even after shutdown.

mod builder;
mod global;
mod hook;
mod pool;

pub use builder::ExecutorBuilder;
pub use global::{configure, execute, global, reset_global, set_global};
pub use hook::{ContextHook, Job, SpanPropagation};
pub use pool::{BoundedExecutor, PoolStats};
