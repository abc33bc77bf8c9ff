//! # In-memory broadcast notifier.
//!
//! [`BroadcastNotifier`] is a thin wrapper around [`tokio::sync::broadcast`] that
//! delivers [`Notification`]s to every live [`Subscription`] whose channel matches.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Subscriptions (many):
//!   handler A ──┐                       ┌──► Subscription(channel A) ─ keeps A, skips B
//!   handler B ──┼──► BroadcastNotifier ─┤
//!   handler N ──┘   (broadcast chan)    └──► Subscription(channel B) ─ keeps B, skips A
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer is shared by all subscriptions.
//! - **Lag handling**: a subscription that falls behind skips the oldest items and logs it.
//! - **No persistence**: a payload published before anyone subscribed is lost, and
//!   `publish()` reports [`NotifyError::NoSubscribers`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use super::{ChannelId, Notifier};
use crate::error::NotifyError;
use crate::handler::Rendered;

/// Global sequence counter for notification ordering.
static NOTIFICATION_SEQ: AtomicU64 = AtomicU64::new(0);

/// A rendered payload addressed to one channel.
#[derive(Clone, Debug)]
pub struct Notification {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Channel the payload was published to.
    pub channel: ChannelId,
    /// Placeholder region the payload replaces.
    pub target: Arc<str>,
    /// The rendered payload.
    pub payload: Rendered,
}

impl Notification {
    /// Creates a notification with the current timestamp and next sequence number.
    pub fn new(channel: ChannelId, target: impl Into<Arc<str>>, payload: Rendered) -> Self {
        Self {
            seq: NOTIFICATION_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            channel,
            target: target.into(),
            payload,
        }
    }
}

/// Broadcast transport for rendered payloads.
///
/// ### Properties
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Creates a notifier with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribes to payloads published to `channel` from now on.
    pub fn subscribe(&self, channel: &ChannelId) -> Subscription {
        Subscription {
            channel: channel.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Subscribes to every channel.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Number of live receivers across all channels.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    /// Capacity of 1024 notifications.
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, channel: &ChannelId, target: &str, payload: &Rendered) -> Result<(), NotifyError> {
        self.tx
            .send(Notification::new(channel.clone(), target, payload.clone()))
            .map(|_| ())
            .map_err(|_| NotifyError::NoSubscribers {
                channel: channel.to_string(),
            })
    }
}

/// Receiver of the payloads published to one channel.
pub struct Subscription {
    channel: ChannelId,
    rx: broadcast::Receiver<Notification>,
}

impl Subscription {
    /// Channel this subscription listens to.
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Waits for the next payload on this channel.
    ///
    /// Returns `None` once every notifier handle is dropped.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(n) if n.channel == self.channel => return Some(n),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Blocking variant of [`recv`](Self::recv) for callers outside an async runtime.
    pub fn blocking_recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.blocking_recv() {
                Ok(n) if n.channel == self.channel => return Some(n),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next already published payload on this channel, if any.
    pub fn try_recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.try_recv() {
                Ok(n) if n.channel == self.channel => return Some(n),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn lagged(&self, skipped: u64) {
        warn!(channel = %self.channel, skipped, "subscription lagged; notifications skipped");
    }
}
