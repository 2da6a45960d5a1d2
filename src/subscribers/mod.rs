//! # Event subscribers.
//!
//! Observers of the driver's [`Bus`](crate::events::Bus) implement [`Subscribe`]
//! and are attached with [`DriverBuilder::with_subscribers`](crate::DriverBuilder::with_subscribers).
//!
//! ```text
//! Bus ──► listener ──► SubscriberSet ──┬──► [queue] ──► worker ──► LogWriter::on_event
//!                                      └──► [queue] ──► worker ──► Custom::on_event
//! ```
//!
//! ## Implementing a subscriber
//! ```no_run
//! use async_trait::async_trait;
//! use udpcast::{Event, EventKind, Subscribe};
//!
//! struct DropCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for DropCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::QueueOverflow {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "drop-counter" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
