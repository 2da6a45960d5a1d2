//! Receive-failure throttling policies.
//!
//! When the broadcast socket keeps failing (interface down, buffer errors), the
//! receiver must keep listening but should not spin. These types decide how long
//! it waits between consecutive failed receives.
//!
//! ## Contents
//! - [`BackoffPolicy`] delay per consecutive failure (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization applied to each delay
//!
//! ## Quick wiring
//! ```text
//! DriverConfig { recv_backoff: BackoffPolicy }
//!      └─► core::receiver::Receiver
//!           - failures += 1 on each receive error
//!           - sleeps recv_backoff.delay_for(failures - 1), cancellable
//!           - failures = 0 on the next successful receive
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=10ms, factor=2.0, max=1s, jitter=Equal.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
