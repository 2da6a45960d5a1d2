//! # LogWriter: renders driver events through `tracing`.
//!
//! Traffic events go out at `trace`/`debug`, queue pressure and failures at
//! `warn`, lifecycle at `info`. Pair it with any `tracing` subscriber:
//!
//! ```text
//! INFO  udpcast::events: driver started transport=udp-broadcast 10.255.255.255:6013
//! DEBUG udpcast::events: client subscribed client=client#1
//! WARN  udpcast::events: queue overflow, newest packet dropped client=client#1 capacity=160
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "udpcast::events";

/// Event subscriber that logs every event with `tracing`.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let client = e.client.map(|c| c.to_string());
        let client = client.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::DriverStarted => {
                tracing::info!(target: TARGET, seq = e.seq, transport = reason, "driver started");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: TARGET, seq = e.seq, "shutdown requested");
            }
            EventKind::DriverStopped => {
                tracing::info!(target: TARGET, seq = e.seq, discarded = ?e.delivered, "driver stopped");
            }
            EventKind::GraceExceeded => {
                tracing::warn!(target: TARGET, seq = e.seq, grace_ms = ?e.delay_ms, "receiver aborted after grace period");
            }
            EventKind::ClientSubscribed => {
                tracing::debug!(target: TARGET, seq = e.seq, client, "client subscribed");
            }
            EventKind::ClientUnsubscribed => {
                tracing::debug!(target: TARGET, seq = e.seq, client, discarded = ?e.delivered, "client unsubscribed");
            }
            EventKind::PacketSent => {
                tracing::trace!(target: TARGET, seq = e.seq, client, bytes = ?e.bytes, "packet sent");
            }
            EventKind::SendFailed => {
                tracing::warn!(target: TARGET, seq = e.seq, client, bytes = ?e.bytes, reason, "send failed");
            }
            EventKind::PacketReceived => {
                tracing::trace!(target: TARGET, seq = e.seq, bytes = ?e.bytes, queues = ?e.delivered, "packet received");
            }
            EventKind::PacketOversized => {
                tracing::warn!(target: TARGET, seq = e.seq, bytes = ?e.bytes, limit = ?e.capacity, "oversized packet dropped");
            }
            EventKind::ReceiveFailed => {
                tracing::warn!(target: TARGET, seq = e.seq, failures = ?e.attempt, reason, "receive failed");
            }
            EventKind::BackoffScheduled => {
                tracing::debug!(target: TARGET, seq = e.seq, failures = ?e.attempt, delay_ms = ?e.delay_ms, "receive backoff");
            }
            EventKind::QueueGrown => {
                tracing::debug!(target: TARGET, seq = e.seq, client, capacity = ?e.capacity, "queue grown");
            }
            EventKind::QueueOverflow => {
                tracing::warn!(target: TARGET, seq = e.seq, client, capacity = ?e.capacity, "queue overflow, newest packet dropped");
            }
            EventKind::AllocationFailed => {
                tracing::error!(target: TARGET, seq = e.seq, client, bytes = ?e.bytes, "queue growth allocation failed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: TARGET, seq = e.seq, subscriber = ?e.subscriber, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: TARGET, seq = e.seq, subscriber = ?e.subscriber, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
