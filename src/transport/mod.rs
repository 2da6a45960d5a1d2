//! # Broadcast transport.
//!
//! [`Transport`] is the seam between the driver and the network: one outbound
//! datagram per `send`, one inbound datagram per `recv`. [`BroadcastSocket`] is
//! the real implementation over a pair of UDP sockets.
//!
//! ```text
//! submit() ──► Transport::send ──► addr:port (broadcast)
//! medium   ──► Transport::recv ──► Receiver ──► QueueRegistry::fan_out
//! ```

use async_trait::async_trait;

use crate::error::DriverError;

mod broadcast;
#[cfg(test)]
pub(crate) mod scripted;

pub use broadcast::BroadcastSocket;

/// Datagram transport used by the driver.
///
/// `recv` suspends until a datagram arrives; it must be cancel-safe (dropping
/// the future loses nothing), since the receiver races it against shutdown.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one datagram. Returns the number of bytes handed to the OS.
    async fn send(&self, payload: &[u8]) -> Result<usize, DriverError>;

    /// Receives one datagram into `buf`. Returns its length (truncated to `buf.len()`).
    async fn recv(&self, buf: &mut [u8]) -> Result<usize, DriverError>;

    /// Called once by `shutdown` after the receiver has stopped. Releases the
    /// underlying sockets; later `send`/`recv` calls fail.
    fn close(&self) {}

    /// Short description for logs.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}
