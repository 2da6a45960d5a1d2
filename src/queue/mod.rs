//! Per-client delivery queues.
//!
//! ## Contents
//! - [`GrowableRing`] generic growable circular FIFO with a capacity ceiling
//! - [`QueuedMessage`], [`Timestamp`] payload plus arrival stamp
//! - [`QueueRegistry`] client handle → queue map with the fan-out operation
//!
//! ## Data flow
//! ```text
//! Receiver ── fan_out(payload, ts) ──► QueueRegistry
//!                                        ├──► [ring C1] ──► pop(C1)
//!                                        ├──► [ring C2] ──► pop(C2)
//!                                        └──► [ring CN] ──► pop(CN)
//! ```
//!
//! The registry itself is not synchronised; the driver keeps it behind one
//! mutex shared by the receiver task and every client-facing call.

mod message;
mod registry;
mod ring;

pub use message::{QueuedMessage, Timestamp};
pub use registry::{ClientQueue, FanOutReport, QueueRegistry};
pub use ring::{GrowableRing, PushOutcome};
