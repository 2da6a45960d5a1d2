//! # Opaque client identity.
//!
//! [`ClientHandle`] names one consumer attached to the driver. The driver only
//! compares handles for equality and uses them as lookup keys; it never looks
//! inside them.
//!
//! Handles come from two places:
//! - [`ClientHandle::next`] allocates a process-unique handle;
//! - [`ClientHandle::from_raw`] wraps an identifier the host server already owns
//!   (connection id, slot index, ...).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Source of process-unique handles.
static NEXT_CLIENT: AtomicU64 = AtomicU64::new(1);

/// Opaque, copyable identity of one subscribed consumer.
///
/// # Example
/// ```
/// use udpcast::ClientHandle;
///
/// let a = ClientHandle::next();
/// let b = ClientHandle::next();
/// assert_ne!(a, b);
/// assert_eq!(ClientHandle::from_raw(7), ClientHandle::from_raw(7));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientHandle(u64);

impl ClientHandle {
    /// Allocates a handle that no other call to `next` in this process returns.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CLIENT.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Wraps an identifier supplied by the host server.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the wrapped identifier.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}
