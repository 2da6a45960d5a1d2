//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `UdpBroadcast` (lifecycle, clients, sends), the receiver
//!   task (packets, queue growth/overflow, failures), `SubscriberSet` workers.
//! - **Consumers**: the builder's listener task (fans out to `SubscriberSet`)
//!   and anyone holding `UdpBroadcast::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
