//! # Client queue registry.
//!
//! [`QueueRegistry`] maps each subscribed [`ClientHandle`] to its own
//! [`ClientQueue`] and replicates inbound packets into all of them.
//!
//! ## Rules
//! - **Unique keys**: at most one queue per handle; registering twice is a no-op.
//! - **Dense, ordered**: queues are kept in subscription order; removal leaves
//!   no gaps.
//! - **Isolation**: a saturated queue drops the newest packet for that client
//!   only; fan-out continues for everyone else.
//! - **FIFO per client**: pops return packets in the order they were fanned out.
//!
//! Callers must hold the driver's registry lock for every operation so that a
//! fan-out never observes a queue being added, removed or popped halfway.

use std::sync::Arc;

use crate::client::ClientHandle;
use crate::error::DriverError;

use super::message::{QueuedMessage, Timestamp};
use super::ring::{GrowableRing, PushOutcome};

/// One client's delivery queue.
#[derive(Debug)]
pub struct ClientQueue {
    owner: ClientHandle,
    ring: GrowableRing<QueuedMessage>,
    dropped: u64,
}

impl ClientQueue {
    /// Messages waiting to be popped.
    pub fn pending(&self) -> usize {
        self.ring.len()
    }

    /// Current slot count.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Messages dropped because the queue was at its ceiling (or growth failed).
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Outcome of one [`QueueRegistry::fan_out`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    /// Queues that accepted the packet.
    pub delivered: usize,
    /// Queues that grew to accept it, with their new capacity.
    pub grown: Vec<(ClientHandle, usize)>,
    /// Queues at their ceiling that dropped it.
    pub dropped: Vec<ClientHandle>,
    /// Queues whose growth could not allocate; the packet was dropped for them.
    pub alloc_failed: Vec<ClientHandle>,
}

/// Subscription-ordered collection of client queues.
#[derive(Debug)]
pub struct QueueRegistry {
    queues: Vec<ClientQueue>,
    initial_capacity: usize,
    ceiling: usize,
}

impl QueueRegistry {
    /// Creates an empty registry.
    ///
    /// New queues start with `initial_capacity` slots and may grow up to
    /// `max_queue_size` (both clamped to at least 1).
    pub fn new(initial_capacity: usize, max_queue_size: usize) -> Self {
        let ceiling = max_queue_size.max(1);
        Self {
            queues: Vec::new(),
            initial_capacity: initial_capacity.clamp(1, ceiling),
            ceiling,
        }
    }

    /// Creates an empty queue for `client` unless one already exists.
    ///
    /// Returns `true` if a queue was created.
    pub fn register(&mut self, client: ClientHandle) -> Result<bool, DriverError> {
        if self.position(client).is_some() {
            return Ok(false);
        }
        let ring = GrowableRing::try_new(self.initial_capacity, self.ceiling)?;
        self.queues.try_reserve(1)?;
        self.queues.push(ClientQueue {
            owner: client,
            ring,
            dropped: 0,
        });
        Ok(true)
    }

    /// Removes the queue for `client`, discarding anything still in it.
    ///
    /// Returns the number of discarded messages, or `None` if the client had no
    /// queue (which is not an error: a read+write client unsubscribes twice).
    pub fn unregister(&mut self, client: ClientHandle) -> Option<usize> {
        let idx = self.position(client)?;
        let mut queue = self.queues.remove(idx);
        Some(queue.ring.clear())
    }

    /// Delivers `payload`, stamped `at`, into every registered queue.
    pub fn fan_out(&mut self, payload: Arc<[u8]>, at: Timestamp) -> FanOutReport {
        let mut report = FanOutReport::default();

        for queue in &mut self.queues {
            let msg = QueuedMessage::new(Arc::clone(&payload), at);
            match queue.ring.push(msg) {
                Ok(PushOutcome::Stored) => report.delivered += 1,
                Ok(PushOutcome::Grown { to, .. }) => {
                    report.delivered += 1;
                    report.grown.push((queue.owner, to));
                }
                Ok(PushOutcome::Rejected) => {
                    queue.dropped += 1;
                    report.dropped.push(queue.owner);
                }
                Err(_) => {
                    queue.dropped += 1;
                    report.alloc_failed.push(queue.owner);
                }
            }
        }
        report
    }

    /// Number of undelivered messages for `client`.
    pub fn pending_count(&self, client: ClientHandle) -> Result<usize, DriverError> {
        self.queue(client)
            .map(ClientQueue::pending)
            .ok_or(DriverError::ClientNotFound { client })
    }

    /// Removes and returns the oldest message for `client`.
    ///
    /// `Ok(None)` means the queue exists but is empty.
    pub fn pop(&mut self, client: ClientHandle) -> Result<Option<QueuedMessage>, DriverError> {
        let idx = self
            .position(client)
            .ok_or(DriverError::ClientNotFound { client })?;
        Ok(self.queues[idx].ring.pop())
    }

    /// Length of the oldest message for `client`, without removing it.
    pub fn front_len(&self, client: ClientHandle) -> Result<Option<usize>, DriverError> {
        self.queue(client)
            .map(|q| q.ring.front().map(QueuedMessage::len))
            .ok_or(DriverError::ClientNotFound { client })
    }

    /// Queue for `client`, if registered.
    pub fn queue(&self, client: ClientHandle) -> Option<&ClientQueue> {
        self.queues.iter().find(|q| q.owner == client)
    }

    /// True if `client` holds a queue.
    pub fn contains(&self, client: ClientHandle) -> bool {
        self.position(client).is_some()
    }

    /// Registered clients in subscription order.
    pub fn clients(&self) -> impl Iterator<Item = ClientHandle> + '_ {
        self.queues.iter().map(|q| q.owner)
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// True if no client is registered.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Frees every queue. Returns the total number of discarded messages.
    pub fn drain(&mut self) -> usize {
        self.queues
            .drain(..)
            .map(|mut q| q.ring.clear())
            .sum()
    }

    fn position(&self, client: ClientHandle) -> Option<usize> {
        self.queues.iter().position(|q| q.owner == client)
    }
}
