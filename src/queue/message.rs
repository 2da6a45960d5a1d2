//! Queued message and its arrival timestamp.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock instant with microsecond resolution, counted from the Unix epoch.
///
/// Splits into the `(seconds, microseconds)` pair the upstream device
/// interface hands back with each message.
///
/// # Example
/// ```
/// use udpcast::Timestamp;
///
/// let ts = Timestamp::from_micros(3_000_250);
/// assert_eq!(ts.secs(), 3);
/// assert_eq!(ts.subsec_micros(), 250);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    micros: u64,
}

impl Timestamp {
    /// Builds a timestamp from microseconds since the epoch.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    /// Converts a [`SystemTime`]; instants before the epoch saturate to zero.
    #[must_use]
    pub fn from_system(at: SystemTime) -> Self {
        let micros = at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros().min(u128::from(u64::MAX)) as u64)
            .unwrap_or(0);
        Self { micros }
    }

    /// Microseconds since the epoch.
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.micros
    }

    /// Whole seconds since the epoch.
    #[inline]
    #[must_use]
    pub const fn secs(self) -> u64 {
        self.micros / 1_000_000
    }

    /// Microsecond remainder (`0..1_000_000`).
    #[inline]
    #[must_use]
    pub const fn subsec_micros(self) -> u32 {
        (self.micros % 1_000_000) as u32
    }

    /// Converts back to a [`SystemTime`].
    #[must_use]
    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_micros(self.micros)
    }
}

/// One inbound broadcast payload as stored in a client queue.
///
/// The payload is immutable and shared between every queue that received the
/// same packet; popping hands the caller its own reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedMessage {
    payload: Arc<[u8]>,
    arrival: Timestamp,
}

impl QueuedMessage {
    /// Creates a message stamped with `arrival`.
    pub fn new(payload: impl Into<Arc<[u8]>>, arrival: Timestamp) -> Self {
        Self {
            payload: payload.into(),
            arrival,
        }
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True for an empty datagram.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// When the receiver observed the packet.
    #[inline]
    pub fn arrival(&self) -> Timestamp {
        self.arrival
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_split() {
        let ts = Timestamp::from_micros(1_700_000_123_456_789);
        assert_eq!(ts.secs(), 1_700_000_123);
        assert_eq!(ts.subsec_micros(), 456_789);
    }

    #[test]
    fn test_timestamp_system_roundtrip() {
        let at = UNIX_EPOCH + Duration::from_micros(5_000_001);
        let ts = Timestamp::from_system(at);
        assert_eq!(ts.as_micros(), 5_000_001);
        assert_eq!(ts.to_system_time(), at);
    }

    #[test]
    fn test_timestamp_before_epoch_saturates() {
        let at = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(Timestamp::from_system(at), Timestamp::default());
    }

    #[test]
    fn test_message_shares_payload() {
        let payload: Arc<[u8]> = Arc::from(&b"hello"[..]);
        let a = QueuedMessage::new(Arc::clone(&payload), Timestamp::from_micros(1));
        let b = QueuedMessage::new(Arc::clone(&payload), Timestamp::from_micros(1));
        assert_eq!(a, b);
        assert_eq!(a.payload(), b"hello");
        assert_eq!(a.len(), 5);
        assert_eq!(Arc::strong_count(&payload), 3);
    }
}
