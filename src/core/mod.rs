//! Driver core: lifecycle, receiver task and configuration.
//!
//! ```text
//! DriverBuilder ──build──► UdpBroadcast ──setup──► Transport + QueueRegistry
//!       │                      │                         ▲
//!       │                      └── spawn ──► Receiver ───┘ fan_out
//!       └── listener: Bus ──► SubscriberSet
//! ```
//!
//! Internal modules:
//! - [`receiver`]: the long-running receive/fan-out loop;
//! - [`clock`]: strictly increasing arrival stamps;
//! - [`shutdown`]: termination signal helper used by `serve`.

use std::sync::{Arc, Mutex};

use crate::queue::QueueRegistry;

mod builder;
mod clock;
mod config;
mod driver;
mod receiver;
mod shutdown;

pub use builder::DriverBuilder;
pub use config::{
    DEFAULT_ADDR, DEFAULT_INITIAL_QUEUE_CAPACITY, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_PORT,
    DriverConfig, MAX_UDP_PAYLOAD,
};
pub use driver::{QueueStats, Retrieved, UdpBroadcast};
pub use receiver::ReceiverStats;
pub use shutdown::wait_for_shutdown_signal;

/// The one lock guarding every client queue. `None` while the driver is inactive.
pub(crate) type SharedQueues = Arc<Mutex<Option<QueueRegistry>>>;
