use std::fmt;
use std::sync::Arc;

/// Prefix of generated channel identifiers.
const PREFIX: &str = "async_frame_";

/// Identifier of the channel a handler publishes its outcome to.
///
/// Generated ids carry 128 random bits, so concurrently live handlers sharing a
/// transport never collide. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(Arc<str>);

impl ChannelId {
    /// Generates a fresh random identifier (`async_frame_` + 32 hex digits).
    pub fn generate() -> Self {
        let bits: u128 = rand::random();
        Self(format!("{PREFIX}{bits:032x}").into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl From<String> for ChannelId {
    fn from(id: String) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
