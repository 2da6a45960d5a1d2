//! # udpcast
//!
//! A UDP broadcast driver with per-client fan-out queues.
//!
//! Every datagram heard on the broadcast port is copied into the private
//! queue of every subscribed client; each client drains its copy at its own
//! pace. Outbound payloads from any client are broadcast immediately, so all
//! hosts on the segment (including this one) hear them.
//!
//! ## Architecture
//! ```text
//!   client A    client B    client N            (host server request handlers)
//!      │ ▲         │ ▲         │ ▲
//!      │ │ retrieve│ │         │ │
//!      ▼ │         ▼ │         ▼ │
//! ┌──────────────────────────────────────────┐
//! │  UdpBroadcast (client-facing API)        │
//! │   subscribe / unsubscribe / pending /    │
//! │   retrieve ──► Mutex<Option<Registry>>   │
//! │   submit   ──► Transport::send ──────────┼──► addr:port (broadcast)
//! └──────────────────────────────────────────┘
//!                      ▲ fan_out
//! ┌────────────────────┴─────────────────────┐
//! │  Receiver task                           │
//! │   loop { recv ─► stamp ─► fan_out }      │◄── 0.0.0.0:port (SO_REUSEADDR)
//! └────────────────────┬─────────────────────┘
//!                      ▼ publish
//!              Bus ──► SubscriberSet ──► LogWriter / custom observers
//! ```
//!
//! ## Queues
//! Each client queue is a [`GrowableRing`](queue::GrowableRing): it starts
//! small, doubles on demand up to `max_queue_size`, and once full at the
//! ceiling drops the newest packet for that client only.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use udpcast::{ClientHandle, DriverConfig, LogWriter, Subscribe, UdpBroadcast};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), udpcast::DriverError> {
//!     let driver = UdpBroadcast::builder(DriverConfig::from_env()?)
//!         .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
//!         .build();
//!     driver.setup().await?;
//!
//!     let me = ClientHandle::next();
//!     driver.subscribe(me)?;
//!     driver.submit(me, b"hello, segment").await?;
//!
//!     driver.shutdown().await
//! }
//! ```

mod client;
mod core;
mod device;
mod error;
mod events;
mod policies;
pub mod queue;
mod subscribers;
pub mod transport;

// ---- Public re-exports ----

pub use client::ClientHandle;
pub use crate::core::{
    DEFAULT_ADDR, DEFAULT_INITIAL_QUEUE_CAPACITY, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_PORT,
    DriverBuilder, DriverConfig, MAX_UDP_PAYLOAD, QueueStats, ReceiverStats, Retrieved,
    UdpBroadcast, wait_for_shutdown_signal,
};
pub use device::{DataFrame, Device};
pub use error::DriverError;
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use queue::{QueuedMessage, Timestamp};
pub use subscribers::{Subscribe, SubscriberSet};
pub use transport::{BroadcastSocket, Transport};

// Built-in `tracing` subscriber for runtime events.
// Enable with: `--features logging` (on by default).
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
