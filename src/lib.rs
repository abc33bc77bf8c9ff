//! # framevisor
//!
//! **Framevisor** runs independent units of work on a bounded worker pool, combines
//! their results, and delivers exactly one rendered outcome out-of-band.
//!
//! The caller renders a loading placeholder immediately and returns; once every
//! promise has settled, the outcome handler renders success or failure and publishes
//! it to a uniquely identified channel.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  submit(f1)  │   │  submit(f2)  │   │  submit(fN)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  BoundedExecutor                                                  │
//! │  - worker threads (min_workers..=max_workers)                     │
//! │  - bounded queue (max_queue_depth)                                │
//! │  - SaturationPolicy (Reject / RunInline / Block)                  │
//! │  - ContextHook (ambient state carried into each task)             │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   Promise<T> #1      Promise<T> #2      Promise<T> #N
//!        └──────────────────┼──────────────────┘
//!                           ▼
//!                fan_in ─► Promise<Vec<T>> (input order, lowest-index error)
//!                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  OutcomeHandler (Idle ─► Loading ─► Succeeded | Failed)           │
//! │  - success / failure strategies                                   │
//! │  - ErrorSink (one report per failure)                             │
//! └──────────────────────────┬────────────────────────────────────────┘
//!                            ▼
//!              Notifier::publish(channel_id, target, payload)   (exactly once)
//!                            ▼
//!                   subscribers of channel_id
//! ```
//!
//! ### Lifecycle
//! ```text
//! caller thread                          executor workers
//! ─────────────                          ────────────────
//! handler.launch(promises)
//!   ├─► render_loading()  ─► "Loading..."
//!   └─► fan_in(..).when_settled(..) ───► (all promises settled)
//!                                          ├─ Ok(values) ─► success strategy ─► publish
//!                                          └─ Err(e)     ─► sink.report(e)
//!                                                            ─► failure strategy ─► publish
//! returns Frame { loading, channel_id }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Executor**      | Bounded pool with a saturation policy and context hook.       | [`BoundedExecutor`], [`SaturationPolicy`]   |
//! | **Promises**      | Settle-once values with `then` / `rescue` / `wait`.           | [`Promise`], [`Resolver`], [`fan_in`]       |
//! | **Handlers**      | Loading placeholder plus one published outcome.               | [`OutcomeHandler`], [`Rendered`]            |
//! | **Delivery**      | Channel-addressed publish and error reporting.                | [`Notifier`], [`ErrorSink`], [`ChannelId`]  |
//! | **Errors**        | Typed errors for saturation, tasks and handlers.              | [`TaskError`], [`HandlerError`]             |
//! | **Configuration** | Pool sizing and a replaceable process default.                | [`ExecutorConfig`], [`executor::configure`] |
//!
//! ## Example
//! ```rust
//! use framevisor::{BoundedExecutor, BroadcastNotifier, ExecutorConfig, HandlerError, OutcomeHandler, TaskError};
//!
//! let exec = BoundedExecutor::new(ExecutorConfig::default());
//! let bus = BroadcastNotifier::default();
//!
//! let handler = OutcomeHandler::new("dashboard", bus.clone())
//!     .with_executor(exec.clone())
//!     .on_success(|rows: &[String]| rows.join(" | "))
//!     .on_failure(|err: &HandlerError| format!("unavailable ({})", err.as_label()));
//! let mut sub = bus.subscribe(handler.channel_id());
//!
//! let promises = vec![
//!     exec.submit(|| Ok::<_, TaskError>("users: 42".to_string())).unwrap(),
//!     exec.submit(|| Ok::<_, TaskError>("orders: 7".to_string())).unwrap(),
//! ];
//!
//! let frame = handler.launch(promises);
//! assert_eq!(frame.loading.as_str(), "Loading...");
//!
//! let outcome = sub.blocking_recv().unwrap();
//! assert_eq!(outcome.payload.as_str(), "users: 42 | orders: 7");
//! ```

mod config;
mod error;
pub mod executor;
mod handler;
mod notify;
mod promise;

// ---- Public re-exports ----

pub use config::{ExecutorConfig, SaturationPolicy};
pub use error::{HandlerError, NotifyError, SaturationError, SetupError, TaskError};
pub use executor::{BoundedExecutor, ContextHook, ExecutorBuilder, Job, PoolStats, SpanPropagation};
pub use handler::{
    DEFAULT_FAILURE, DEFAULT_LOADING, DEFAULT_SUCCESS, Frame, FrameStatus, HandlerState, OutcomeHandler,
    Rendered,
};
pub use notify::{
    BroadcastNotifier, ChannelId, ErrorSink, LogSink, Notification, Notifier, ReportContext, Subscription,
};
pub use promise::{Promise, Resolver, fan_in};
