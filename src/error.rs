//! Error types used by the broadcast driver.
//!
//! [`DriverError`] covers every failure the driver reports to its callers:
//!
//! - **transport**: socket creation, option, bind, send and receive failures;
//! - **lookup**: operating on a client that holds no queue;
//! - **usage**: oversized payloads, undersized buffers, lifecycle misuse;
//! - **allocation**: queue storage could not be reserved.
//!
//! A client queue hitting its ceiling is *not* an error: the newest message is
//! dropped for that client and a `QueueOverflow` event is published instead.
//!
//! Like the rest of the crate, errors carry a stable [`DriverError::as_label`]
//! for logs/metrics.

use std::collections::TryReserveError;
use std::io;
use std::sync::PoisonError;
use std::time::Duration;

use thiserror::Error;

use crate::client::ClientHandle;

/// # Errors produced by the broadcast driver.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DriverError {
    /// A socket operation failed.
    ///
    /// Fatal when raised by `setup`; otherwise the operation simply yields
    /// "not sent" / "no packet".
    #[error("broadcast socket {op} failed: {source}")]
    Transport {
        /// Operation that failed (`create`, `configure`, `bind`, `send`, `receive`, ...).
        op: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The configured broadcast address is not a usable IPv4 address.
    #[error("invalid broadcast address {addr:?}: {reason}")]
    InvalidAddress {
        /// Address as configured.
        addr: String,
        /// Parser message.
        reason: String,
    },

    /// Configuration value rejected at load/validation time.
    #[error("invalid configuration: {reason}")]
    Config {
        /// What was wrong.
        reason: String,
    },

    /// The client has no queue (never subscribed, or already unsubscribed).
    #[error("no queue registered for {client}")]
    ClientNotFound {
        /// Offending handle.
        client: ClientHandle,
    },

    /// Outbound payload exceeds the server maximum message size.
    #[error("payload of {len} bytes exceeds maximum message size {max}")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Caller's buffer cannot hold the next queued message; the message stays queued.
    #[error("buffer holds {available} bytes but next message needs {needed}")]
    BufferTooSmall {
        /// Length of the pending message.
        needed: usize,
        /// Length of the caller's buffer.
        available: usize,
    },

    /// Queue storage could not be reserved.
    #[error("queue allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// Operation requires an active driver (call `setup` first).
    #[error("driver is not running")]
    NotRunning,

    /// `setup` called on an active driver.
    #[error("driver is already running")]
    AlreadyRunning,

    /// The registry lock was poisoned by a panicking holder.
    #[error("queue registry lock poisoned")]
    Poisoned,

    /// The receiver task did not stop within the grace period and was aborted.
    #[error("receiver did not stop within {grace:?}; aborted")]
    GraceExceeded {
        /// Configured grace period.
        grace: Duration,
    },

    /// The OS signal handler used by `serve` could not be installed.
    #[error("failed to install shutdown signal handler: {source}")]
    Signal {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl DriverError {
    /// Builds a [`DriverError::Transport`] for the given operation.
    #[inline]
    pub fn transport(op: &'static str, source: io::Error) -> Self {
        DriverError::Transport { op, source }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use udpcast::{ClientHandle, DriverError};
    ///
    /// let err = DriverError::ClientNotFound { client: ClientHandle::from_raw(1) };
    /// assert_eq!(err.as_label(), "client_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DriverError::Transport { .. } => "transport",
            DriverError::InvalidAddress { .. } => "invalid_address",
            DriverError::Config { .. } => "invalid_config",
            DriverError::ClientNotFound { .. } => "client_not_found",
            DriverError::PayloadTooLarge { .. } => "payload_too_large",
            DriverError::BufferTooSmall { .. } => "buffer_too_small",
            DriverError::Allocation(_) => "allocation_failed",
            DriverError::NotRunning => "not_running",
            DriverError::AlreadyRunning => "already_running",
            DriverError::Poisoned => "lock_poisoned",
            DriverError::GraceExceeded { .. } => "grace_exceeded",
            DriverError::Signal { .. } => "signal",
        }
    }

    /// Indicates whether the caller can keep using the driver after this error.
    ///
    /// Returns `false` for configuration, allocation, poisoning, grace and signal failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DriverError::Transport { .. }
                | DriverError::ClientNotFound { .. }
                | DriverError::PayloadTooLarge { .. }
                | DriverError::BufferTooSmall { .. }
                | DriverError::NotRunning
                | DriverError::AlreadyRunning
        )
    }
}

impl<T> From<PoisonError<T>> for DriverError {
    fn from(_: PoisonError<T>) -> Self {
        DriverError::Poisoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_labels_are_stable() {
        let err = DriverError::transport("bind", io::Error::from(io::ErrorKind::AddrInUse));
        assert_eq!(err.as_label(), "transport");
        assert_eq!(DriverError::NotRunning.as_label(), "not_running");
        assert_eq!(
            DriverError::BufferTooSmall { needed: 4, available: 2 }.as_label(),
            "buffer_too_small"
        );
    }

    #[test]
    fn test_display_mentions_operation_and_client() {
        let err = DriverError::transport("send", io::Error::other("network down"));
        assert!(err.to_string().contains("send"));
        assert!(err.to_string().contains("network down"));

        let err = DriverError::ClientNotFound { client: ClientHandle::from_raw(3) };
        assert_eq!(err.to_string(), "no queue registered for client#3");
    }

    #[test]
    fn test_recoverable_classes() {
        assert!(DriverError::ClientNotFound { client: ClientHandle::from_raw(1) }.is_recoverable());
        assert!(DriverError::PayloadTooLarge { len: 10, max: 5 }.is_recoverable());
        assert!(!DriverError::Poisoned.is_recoverable());
        assert!(!DriverError::Config { reason: "x".into() }.is_recoverable());
    }

    #[test]
    fn test_signal_failure_is_fatal() {
        let err = DriverError::Signal { source: io::Error::from(io::ErrorKind::PermissionDenied) };
        assert_eq!(err.as_label(), "signal");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("signal handler"));
    }

    #[test]
    fn test_poison_converts() {
        let lock = Arc::new(Mutex::new(0u8));
        let l2 = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = l2.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err: DriverError = lock.lock().unwrap_err().into();
        assert!(matches!(err, DriverError::Poisoned));
    }
}
