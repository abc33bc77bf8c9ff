//! # Handler lifecycle.
//!
//! ```text
//! Idle ──render_loading()──► Loading ──fan-in fulfilled──► Succeeded
//!   │                           └──────fan-in rejected───► Failed
//!   └──setup failed / handle_promises without a loading render──► Succeeded | Failed
//! ```
//!
//! [`FrameStatus`] is a shared, read-only view of that state; only the handler moves it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of an outcome handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerState {
    /// Created, nothing rendered yet.
    Idle,
    /// Loading placeholder rendered; waiting for the promises.
    Loading,
    /// Success payload published (terminal).
    Succeeded,
    /// Failure payload published (terminal).
    Failed,
}

impl HandlerState {
    /// Returns `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, HandlerState::Succeeded | HandlerState::Failed)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            HandlerState::Idle => "idle",
            HandlerState::Loading => "loading",
            HandlerState::Succeeded => "succeeded",
            HandlerState::Failed => "failed",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            HandlerState::Idle => 0,
            HandlerState::Loading => 1,
            HandlerState::Succeeded => 2,
            HandlerState::Failed => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => HandlerState::Idle,
            1 => HandlerState::Loading,
            2 => HandlerState::Succeeded,
            _ => HandlerState::Failed,
        }
    }
}

/// Shared view of a handler's state.
#[derive(Clone, Debug)]
pub struct FrameStatus(Arc<AtomicU8>);

impl FrameStatus {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(HandlerState::Idle.to_u8())))
    }

    /// Returns the current state.
    pub fn state(&self) -> HandlerState {
        HandlerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Returns `true` once the outcome was published.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// `Idle → Loading`; no-op from any other state.
    pub(crate) fn start_loading(&self) {
        let _ = self.0.compare_exchange(
            HandlerState::Idle.to_u8(),
            HandlerState::Loading.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Moves to a terminal state.
    ///
    /// Returns `false` (and changes nothing) if a terminal state was already reached.
    pub(crate) fn finish(&self, to: HandlerState) -> bool {
        debug_assert!(to.is_terminal());
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (!HandlerState::from_u8(cur).is_terminal()).then_some(to.to_u8())
            })
            .is_ok()
    }
}
