//! # Runtime events emitted by the broadcast driver.
//!
//! [`EventKind`] groups what the driver reports into:
//! - **Lifecycle**: setup, shutdown request, stop, grace exceeded
//! - **Clients**: subscribe / unsubscribe
//! - **Traffic**: packets sent and received, transport failures, backoff
//! - **Queues**: growth, overflow at the ceiling, allocation failure
//! - **Observers**: subscriber overflow / panic
//!
//! [`Event`] carries the optional metadata relevant to each kind.
//!
//! ## Ordering guarantees
//! Every event gets a process-wide, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use udpcast::{ClientHandle, Event, EventKind};
//!
//! let ev = Event::new(EventKind::QueueGrown)
//!     .with_client(ClientHandle::from_raw(7))
//!     .with_capacity(20);
//!
//! assert_eq!(ev.kind, EventKind::QueueGrown);
//! assert_eq!(ev.capacity, Some(20));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::client::ClientHandle;

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle ===
    /// Sockets are open and the receiver task is running.
    ///
    /// Sets: `reason` (transport name).
    DriverStarted,

    /// `shutdown` was called on a running driver.
    ShutdownRequested,

    /// Receiver joined, queues freed, sockets closed.
    ///
    /// Sets: `delivered` (messages discarded with the queues).
    DriverStopped,

    /// Receiver did not exit within the grace period and was aborted.
    ///
    /// Sets: `delay_ms` (grace).
    GraceExceeded,

    // === Clients ===
    /// A queue was created for a client.
    ///
    /// Sets: `client`.
    ClientSubscribed,

    /// A client's queue was removed.
    ///
    /// Sets: `client`, `delivered` (messages discarded with it).
    ClientUnsubscribed,

    // === Traffic ===
    /// Outbound payload handed to the socket.
    ///
    /// Sets: `client`, `bytes`.
    PacketSent,

    /// Outbound send failed; nothing was sent.
    ///
    /// Sets: `client`, `bytes`, `reason`.
    SendFailed,

    /// Inbound packet stamped and fanned out.
    ///
    /// Sets: `bytes`, `delivered` (queues that accepted it).
    PacketReceived,

    /// Inbound datagram longer than `max_message_size`; dropped unread.
    ///
    /// Sets: `bytes` (at least `max_message_size + 1`), `capacity` (the limit).
    PacketOversized,

    /// Receive failed; the loop keeps going.
    ///
    /// Sets: `attempt` (consecutive failures), `reason`.
    ReceiveFailed,

    /// Receiver waits before the next receive after a failure.
    ///
    /// Sets: `attempt`, `delay_ms`.
    BackoffScheduled,

    // === Queues ===
    /// A client queue doubled its capacity.
    ///
    /// Sets: `client`, `capacity` (new).
    QueueGrown,

    /// A client queue at its ceiling dropped the newest packet.
    ///
    /// Sets: `client`, `capacity`, `bytes`.
    QueueOverflow,

    /// Growing a client queue failed to allocate; the packet was dropped for it.
    ///
    /// Sets: `client`, `bytes`.
    AllocationFailed,

    // === Observers ===
    /// An event subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberOverflow,

    /// An event subscriber panicked while handling an event.
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide sequence number.
    pub seq: u64,
    /// Wall-clock time of emission.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Client the event concerns.
    pub client: Option<ClientHandle>,
    /// Payload size in bytes.
    pub bytes: Option<usize>,
    /// Queue capacity in slots.
    pub capacity: Option<usize>,
    /// Queue or message count (delivered, discarded).
    pub delivered: Option<usize>,
    /// Delay in milliseconds (backoff, grace).
    pub delay_ms: Option<u32>,
    /// Consecutive failure count.
    pub attempt: Option<u32>,
    /// Human-readable detail.
    pub reason: Option<Arc<str>>,
    /// Name of the event subscriber involved.
    pub subscriber: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind, stamped now with the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            client: None,
            bytes: None,
            capacity: None,
            delivered: None,
            delay_ms: None,
            attempt: None,
            reason: None,
            subscriber: None,
        }
    }

    #[inline]
    pub fn with_client(mut self, client: ClientHandle) -> Self {
        self.client = Some(client);
        self
    }

    #[inline]
    pub fn with_bytes(mut self, n: usize) -> Self {
        self.bytes = Some(n);
        self
    }

    #[inline]
    pub fn with_capacity(mut self, n: usize) -> Self {
        self.capacity = Some(n);
        self
    }

    #[inline]
    pub fn with_delivered(mut self, n: usize) -> Self {
        self.delivered = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_subscriber(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subscriber = Some(name.into());
        self
    }

    /// Subscriber dropped an event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_subscriber(subscriber)
            .with_reason(reason)
    }

    /// Subscriber panicked.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subscriber(subscriber)
            .with_reason(info)
    }

    /// True for events raised by the subscriber machinery itself.
    ///
    /// These are never fed back into the subscriber set.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
