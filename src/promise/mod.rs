//! # Promises and fan-in.
//!
//! - [`Promise`] handle to a value settled exactly once (fulfilled or rejected)
//! - [`Resolver`] write side of a promise
//! - [`fan_in`] / [`Promise::zip`] collect several promises into one

mod fan_in;
#[allow(clippy::module_inception)]
mod promise;

pub use fan_in::fan_in;
pub use promise::{Promise, Resolver};

pub(crate) use promise::catch_task;
