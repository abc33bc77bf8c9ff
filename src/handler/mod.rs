//! # Outcome handlers.
//!
//! - [`OutcomeHandler`] waits for a set of promises and publishes one rendered outcome
//! - [`Rendered`] opaque payload produced by a render strategy
//! - [`FrameStatus`] / [`HandlerState`] observable lifecycle of a handler
//! - [`Frame`] what `launch` hands back: loading payload plus channel id

mod outcome;
mod state;
mod strategy;

pub use outcome::{Frame, OutcomeHandler};
pub use state::{FrameStatus, HandlerState};
pub use strategy::{DEFAULT_FAILURE, DEFAULT_LOADING, DEFAULT_SUCCESS, Rendered};
