//! # Receiver task.
//!
//! Listens on the broadcast transport for the whole life of the driver and
//! copies every inbound datagram into every subscribed client queue.
//!
//! ```text
//! loop {
//!   ├─► select! { cancelled → exit, transport.recv() }
//!   ├─► cancelled after recv? → discard packet, exit
//!   ├─► Ok(n > max) → warn, PacketOversized, skip
//!   ├─► Ok(n)  → stamp, lock registry, fan_out, unlock, publish events
//!   └─► Err(e) → warn, ReceiveFailed, backoff (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - A receive error never ends the loop; only cancellation does.
//! - Cancellation is checked again right after each receive returns, so a
//!   packet that races shutdown is never delivered.
//! - The buffer holds one byte more than `max_message_size`, so a datagram the
//!   socket would truncate is recognised and dropped instead of delivered cut.
//! - The registry lock covers exactly one fan-out; events are published after
//!   it is released.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::transport::Transport;

use super::SharedQueues;
use super::clock::StampClock;

/// Counters returned by the receiver when it exits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Datagrams fanned out.
    pub received: u64,
    /// Failed receive calls.
    pub failures: u64,
    /// Datagrams dropped because they completed after cancellation.
    pub discarded: u64,
    /// Datagrams dropped for exceeding `max_message_size`.
    pub oversized: u64,
}

pub(crate) struct Receiver {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) queues: SharedQueues,
    pub(crate) bus: Bus,
    pub(crate) clock: Arc<StampClock>,
    pub(crate) backoff: BackoffPolicy,
    pub(crate) max_message_size: usize,
    pub(crate) queue_ceiling: usize,
}

impl Receiver {
    /// Runs until `token` is cancelled.
    pub(crate) async fn run(self, token: CancellationToken) -> ReceiverStats {
        let mut buf = vec![0u8; self.max_message_size + 1];
        let mut stats = ReceiverStats::default();
        let mut consecutive: u32 = 0;

        loop {
            let res = select! {
                biased;
                _ = token.cancelled() => break,
                res = self.transport.recv(&mut buf) => res,
            };
            if token.is_cancelled() {
                if res.is_ok() {
                    stats.discarded += 1;
                    tracing::trace!("packet arrived after cancellation; discarded");
                }
                break;
            }

            match res {
                Ok(n) if n > self.max_message_size => {
                    consecutive = 0;
                    stats.oversized += 1;
                    tracing::warn!(limit = self.max_message_size, "inbound datagram exceeds max_message_size; dropped");
                    self.bus.publish(
                        Event::new(EventKind::PacketOversized)
                            .with_bytes(n)
                            .with_capacity(self.max_message_size),
                    );
                }
                Ok(n) => {
                    consecutive = 0;
                    stats.received += 1;
                    self.deliver(&buf[..n]);
                }
                Err(err) => {
                    consecutive = consecutive.saturating_add(1);
                    stats.failures += 1;
                    tracing::warn!(error = %err, failures = consecutive, "broadcast receive failed");
                    self.bus.publish(
                        Event::new(EventKind::ReceiveFailed)
                            .with_attempt(consecutive)
                            .with_reason(err.to_string()),
                    );

                    let delay = self.backoff.delay_for(consecutive - 1);
                    if delay.is_zero() {
                        continue;
                    }
                    self.bus.publish(
                        Event::new(EventKind::BackoffScheduled)
                            .with_attempt(consecutive)
                            .with_delay(delay),
                    );
                    select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::debug!(?stats, "receiver exiting");
        stats
    }

    /// Stamps `bytes` and fans them out to every registered queue.
    fn deliver(&self, bytes: &[u8]) {
        let payload: Arc<[u8]> = Arc::from(bytes);
        let at = self.clock.now();

        let report = {
            let mut guard = match self.queues.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::error!("queue registry lock poisoned; packet dropped");
                    return;
                }
            };
            match guard.as_mut() {
                Some(registry) => registry.fan_out(payload, at),
                None => return,
            }
        };

        tracing::trace!(bytes = bytes.len(), queues = report.delivered, "packet fanned out");
        self.bus.publish(
            Event::new(EventKind::PacketReceived)
                .with_bytes(bytes.len())
                .with_delivered(report.delivered),
        );
        for (client, capacity) in report.grown {
            self.bus.publish(
                Event::new(EventKind::QueueGrown)
                    .with_client(client)
                    .with_capacity(capacity),
            );
        }
        for client in report.dropped {
            tracing::debug!(%client, ceiling = self.queue_ceiling, "client queue full; newest packet dropped");
            self.bus.publish(
                Event::new(EventKind::QueueOverflow)
                    .with_client(client)
                    .with_capacity(self.queue_ceiling)
                    .with_bytes(bytes.len()),
            );
        }
        for client in report.alloc_failed {
            tracing::error!(%client, bytes = bytes.len(), "client queue growth failed to allocate; packet dropped");
            self.bus.publish(
                Event::new(EventKind::AllocationFailed)
                    .with_client(client)
                    .with_bytes(bytes.len()),
            );
        }
    }
}
