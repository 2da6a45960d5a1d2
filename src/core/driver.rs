//! # UdpBroadcast: lifecycle and client-facing API.
//!
//! ```text
//!           subscribe / unsubscribe / pending / retrieve
//! clients ─────────────────────────────────────────────► Mutex<Option<QueueRegistry>>
//!    │                                                          ▲
//!    └── submit ──► Transport::send               Receiver ── fan_out
//!                        │                           ▲
//!                        └──────── medium ───────────┘ Transport::recv
//! ```
//!
//! ## Lifecycle
//! - `setup`: open the transport, create an empty registry, spawn the receiver.
//! - `shutdown`: cancel the receiver and wait for it (bounded by `grace`), then
//!   drain and free the registry, then close the transport.
//!
//! While inactive the registry slot is `None`: `subscribe`, `pending`,
//! `retrieve` and `submit` return [`DriverError::NotRunning`], `unsubscribe`
//! and `shutdown` do nothing.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::client::ClientHandle;
use crate::error::DriverError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::{QueueRegistry, QueuedMessage, Timestamp};
use crate::transport::{BroadcastSocket, Transport};

use super::builder::DriverBuilder;
use super::clock::StampClock;
use super::config::DriverConfig;
use super::receiver::{Receiver, ReceiverStats};
use super::shutdown::wait_for_shutdown_signal;
use super::SharedQueues;

/// Result of [`UdpBroadcast::retrieve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retrieved {
    /// Bytes copied into the caller's buffer; `0` when nothing was pending.
    pub len: usize,
    /// Arrival stamp of the message, `None` when nothing was pending.
    pub timestamp: Option<Timestamp>,
}

impl Retrieved {
    const EMPTY: Retrieved = Retrieved {
        len: 0,
        timestamp: None,
    };

    /// True when no message was pending.
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none()
    }
}

/// Snapshot of one client's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub capacity: usize,
    pub ceiling: usize,
    pub dropped: u64,
}

struct Running {
    token: CancellationToken,
    receiver: JoinHandle<ReceiverStats>,
}

/// UDP broadcast driver with per-client fan-out queues.
///
/// Every datagram heard on the broadcast port is copied into the queue of
/// every subscribed client; each client drains its own copy. Outbound
/// payloads are broadcast immediately without queuing.
///
/// # Example
/// ```no_run
/// use udpcast::{ClientHandle, DriverConfig, UdpBroadcast};
///
/// # async fn demo() -> Result<(), udpcast::DriverError> {
/// let driver = UdpBroadcast::new(DriverConfig::default());
/// driver.setup().await?;
///
/// let me = ClientHandle::next();
/// driver.subscribe(me)?;
/// driver.submit(me, b"hello").await?;
///
/// let mut buf = [0u8; 1500];
/// let got = driver.retrieve(me, &mut buf)?;
/// println!("{} bytes", got.len);
///
/// driver.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct UdpBroadcast {
    cfg: DriverConfig,
    bus: Bus,
    queues: SharedQueues,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    lifecycle: AsyncMutex<Option<Running>>,
    clock: Arc<StampClock>,
    listener: Option<CancellationToken>,
}

impl UdpBroadcast {
    /// Creates an inactive driver without event subscribers.
    pub fn new(cfg: DriverConfig) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::new_internal(cfg, bus, None)
    }

    /// Starts a builder for attaching event subscribers.
    pub fn builder(cfg: DriverConfig) -> DriverBuilder {
        DriverBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: DriverConfig,
        bus: Bus,
        listener: Option<CancellationToken>,
    ) -> Self {
        Self {
            cfg,
            bus,
            queues: Arc::new(Mutex::new(None)),
            transport: RwLock::new(None),
            lifecycle: AsyncMutex::new(None),
            clock: Arc::new(StampClock::new()),
            listener,
        }
    }

    // === Lifecycle ===

    /// Opens the broadcast sockets and starts the receiver.
    pub async fn setup(&self) -> Result<(), DriverError> {
        let ip = self.cfg.broadcast_ip()?;
        let port = self.cfg.port;
        self.start_with(move || Ok(Arc::new(BroadcastSocket::open(ip, port)?) as Arc<dyn Transport>))
            .await
    }

    /// Starts the driver over a caller-provided transport.
    pub async fn setup_with(&self, transport: Arc<dyn Transport>) -> Result<(), DriverError> {
        self.start_with(move || Ok(transport)).await
    }

    async fn start_with<F>(&self, open: F) -> Result<(), DriverError>
    where
        F: FnOnce() -> Result<Arc<dyn Transport>, DriverError>,
    {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            return Err(DriverError::AlreadyRunning);
        }
        self.cfg.validate()?;

        let transport = open().inspect_err(|err| {
            tracing::error!(error = %err, "failed to open broadcast transport");
        })?;
        let describe = transport.describe();

        *self.queues.lock()? = Some(QueueRegistry::new(
            self.cfg.initial_capacity_clamped(),
            self.cfg.queue_ceiling(),
        ));
        *self.transport.write()? = Some(Arc::clone(&transport));

        let token = CancellationToken::new();
        let receiver = Receiver {
            transport,
            queues: Arc::clone(&self.queues),
            bus: self.bus.clone(),
            clock: Arc::clone(&self.clock),
            backoff: self.cfg.recv_backoff,
            max_message_size: self.cfg.max_message_size,
            queue_ceiling: self.cfg.queue_ceiling(),
        };
        let handle = tokio::spawn(receiver.run(token.clone()));
        *lifecycle = Some(Running {
            token,
            receiver: handle,
        });

        tracing::info!(transport = %describe, "udp broadcast driver started");
        self.bus
            .publish(Event::new(EventKind::DriverStarted).with_reason(describe));
        Ok(())
    }

    /// Stops the receiver, frees every queue and closes the transport.
    ///
    /// Does nothing if the driver is not running. If the receiver does not exit
    /// within `grace` it is aborted, teardown still completes and
    /// [`DriverError::GraceExceeded`] is returned.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(Running {
            token,
            mut receiver,
        }) = lifecycle.take()
        else {
            return Ok(());
        };

        tracing::info!("udp broadcast driver shutting down");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        token.cancel();

        let grace = self.cfg.grace();
        let outcome = match time::timeout(grace, &mut receiver).await {
            Ok(Ok(stats)) => {
                tracing::debug!(
                    received = stats.received,
                    failures = stats.failures,
                    discarded = stats.discarded,
                    oversized = stats.oversized,
                    "receiver stopped"
                );
                Ok(())
            }
            Ok(Err(join_err)) => {
                tracing::error!(error = %join_err, "receiver task ended abnormally");
                Ok(())
            }
            Err(_elapsed) => {
                receiver.abort();
                let _ = receiver.await;
                tracing::warn!(?grace, "receiver did not stop within grace period; aborted");
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_delay(grace));
                Err(DriverError::GraceExceeded { grace })
            }
        };

        let discarded = recover(self.queues.lock())
            .take()
            .map_or(0, |mut registry| registry.drain());
        let transport = match self.transport.write() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(transport) = transport {
            transport.close();
        }

        tracing::info!(discarded, "udp broadcast driver stopped");
        self.bus
            .publish(Event::new(EventKind::DriverStopped).with_delivered(discarded));
        outcome
    }

    /// Runs until a termination signal, then shuts down.
    pub async fn serve(&self) -> Result<(), DriverError> {
        self.setup().await?;
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Waits for `stop`, then shuts down. A failed `stop` is reported after teardown.
    async fn run_until<F>(&self, stop: F) -> Result<(), DriverError>
    where
        F: Future<Output = io::Result<()>>,
    {
        let waited = stop.await;
        let stopped = self.shutdown().await;
        waited.map_err(|source| DriverError::Signal { source })?;
        stopped
    }

    // === Client-facing API ===

    /// Creates an empty queue for `client`. Subscribing twice is a no-op.
    pub fn subscribe(&self, client: ClientHandle) -> Result<(), DriverError> {
        let created = {
            let mut guard = self.queues.lock()?;
            let registry = guard.as_mut().ok_or(DriverError::NotRunning)?;
            registry.register(client)?
        };
        if created {
            tracing::debug!(%client, "client subscribed");
            self.bus
                .publish(Event::new(EventKind::ClientSubscribed).with_client(client));
        }
        Ok(())
    }

    /// Destroys `client`'s queue and everything in it.
    ///
    /// Unknown clients and an inactive driver are both no-ops.
    pub fn unsubscribe(&self, client: ClientHandle) -> Result<(), DriverError> {
        let discarded = {
            let mut guard = self.queues.lock()?;
            guard.as_mut().and_then(|registry| registry.unregister(client))
        };
        if let Some(discarded) = discarded {
            tracing::debug!(%client, discarded, "client unsubscribed");
            self.bus.publish(
                Event::new(EventKind::ClientUnsubscribed)
                    .with_client(client)
                    .with_delivered(discarded),
            );
        }
        Ok(())
    }

    /// Broadcasts `payload` immediately. `client` is used for attribution only.
    pub async fn submit(&self, client: ClientHandle, payload: &[u8]) -> Result<usize, DriverError> {
        let max = self.cfg.max_message_size;
        if payload.len() > max {
            return Err(DriverError::PayloadTooLarge {
                len: payload.len(),
                max,
            });
        }
        let transport = self.transport.read()?.clone().ok_or(DriverError::NotRunning)?;

        match transport.send(payload).await {
            Ok(n) => {
                tracing::trace!(%client, bytes = n, "packet sent");
                self.bus.publish(
                    Event::new(EventKind::PacketSent)
                        .with_client(client)
                        .with_bytes(n),
                );
                Ok(n)
            }
            Err(err) => {
                tracing::warn!(%client, bytes = payload.len(), error = %err, "broadcast send failed");
                self.bus.publish(
                    Event::new(EventKind::SendFailed)
                        .with_client(client)
                        .with_bytes(payload.len())
                        .with_reason(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Number of messages waiting for `client`.
    pub fn pending(&self, client: ClientHandle) -> Result<usize, DriverError> {
        let guard = self.queues.lock()?;
        let registry = guard.as_ref().ok_or(DriverError::NotRunning)?;
        registry.pending_count(client).inspect_err(log_lookup)
    }

    /// Pops the oldest message for `client` into `buf`.
    ///
    /// Returns a zero-length [`Retrieved`] when nothing is pending. If `buf` is
    /// too small the message stays queued and [`DriverError::BufferTooSmall`]
    /// is returned.
    pub fn retrieve(&self, client: ClientHandle, buf: &mut [u8]) -> Result<Retrieved, DriverError> {
        let msg = {
            let mut guard = self.queues.lock()?;
            let registry = guard.as_mut().ok_or(DriverError::NotRunning)?;
            let Some(needed) = registry.front_len(client).inspect_err(log_lookup)? else {
                return Ok(Retrieved::EMPTY);
            };
            if needed > buf.len() {
                return Err(DriverError::BufferTooSmall {
                    needed,
                    available: buf.len(),
                });
            }
            registry.pop(client)?
        };

        Ok(match msg {
            Some(msg) => {
                buf[..msg.len()].copy_from_slice(msg.payload());
                Retrieved {
                    len: msg.len(),
                    timestamp: Some(msg.arrival()),
                }
            }
            None => Retrieved::EMPTY,
        })
    }

    /// Pops the oldest message for `client`, handing over the shared payload.
    pub fn take(&self, client: ClientHandle) -> Result<Option<QueuedMessage>, DriverError> {
        let mut guard = self.queues.lock()?;
        let registry = guard.as_mut().ok_or(DriverError::NotRunning)?;
        registry.pop(client).inspect_err(log_lookup)
    }

    /// Snapshot of `client`'s queue.
    pub fn queue_stats(&self, client: ClientHandle) -> Result<QueueStats, DriverError> {
        let guard = self.queues.lock()?;
        let registry = guard.as_ref().ok_or(DriverError::NotRunning)?;
        let queue = registry
            .queue(client)
            .ok_or(DriverError::ClientNotFound { client })?;
        Ok(QueueStats {
            pending: queue.pending(),
            capacity: queue.capacity(),
            ceiling: self.cfg.queue_ceiling(),
            dropped: queue.dropped(),
        })
    }

    // === Introspection ===

    /// New receiver of runtime events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.cfg
    }

    /// True between a successful `setup` and the next `shutdown`.
    pub fn is_running(&self) -> bool {
        recover(self.queues.lock()).is_some()
    }

    /// Subscribed clients (0 while inactive).
    pub fn client_count(&self) -> usize {
        recover(self.queues.lock())
            .as_ref()
            .map_or(0, QueueRegistry::len)
    }
}

impl Drop for UdpBroadcast {
    fn drop(&mut self) {
        if let Some(running) = self.lifecycle.get_mut().take() {
            running.token.cancel();
        }
        if let Some(listener) = &self.listener {
            listener.cancel();
        }
    }
}

fn recover<'a, T>(
    res: Result<MutexGuard<'a, T>, std::sync::PoisonError<MutexGuard<'a, T>>>,
) -> MutexGuard<'a, T> {
    res.unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn log_lookup(err: &DriverError) {
    if let DriverError::ClientNotFound { client } = err {
        tracing::warn!(%client, "operation on unsubscribed client");
    }
}
