//! # Driver configuration.
//!
//! [`DriverConfig`] holds every knob of the broadcast driver. It can be built in
//! code, deserialized by a host server (`serde`, all fields optional), or read
//! from `UDPCAST_*` environment variables with [`DriverConfig::from_env`].
//!
//! | Field | Env | Default |
//! |---|---|---|
//! | `addr` | `UDPCAST_ADDR` | `10.255.255.255` |
//! | `port` | `UDPCAST_PORT` | `6013` |
//! | `max_queue_size` | `UDPCAST_MAX_QUEUE_SIZE` | `160` |
//! | `initial_queue_capacity` | `UDPCAST_INITIAL_QUEUE_CAPACITY` | `10` |
//! | `max_message_size` | `UDPCAST_MAX_MESSAGE_SIZE` | `65507` |
//! | `grace_ms` | `UDPCAST_GRACE_MS` | `5000` |
//! | `bus_capacity` | `UDPCAST_BUS_CAPACITY` | `1024` |
//!
//! ## Sentinel values
//! - `port = 0` binds an ephemeral port and broadcasts to whatever port was bound.
//! - `grace_ms = 0` aborts the receiver immediately on shutdown if it has not
//!   already exited.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::DriverError;
use crate::policies::BackoffPolicy;

pub const DEFAULT_ADDR: &str = "10.255.255.255";
pub const DEFAULT_PORT: u16 = 6013;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 160;
pub const DEFAULT_INITIAL_QUEUE_CAPACITY: usize = 10;
/// Largest payload that fits in one IPv4 UDP datagram.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

const ENV_PREFIX: &str = "UDPCAST_";

/// Configuration for [`UdpBroadcast`](crate::UdpBroadcast).
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// IPv4 destination of outbound broadcasts.
    pub addr: String,
    /// UDP port used both to send and to listen.
    pub port: u16,
    /// Ceiling on any one client queue, in messages.
    pub max_queue_size: usize,
    /// Slots a new client queue starts with.
    pub initial_queue_capacity: usize,
    /// Largest payload accepted by `submit` and read by the receiver.
    pub max_message_size: usize,
    /// How long `shutdown` waits for the receiver before aborting it.
    pub grace_ms: u64,
    /// Event bus ring size.
    pub bus_capacity: usize,
    /// Delay schedule after consecutive receive failures.
    #[serde(skip)]
    pub recv_backoff: BackoffPolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            port: DEFAULT_PORT,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            initial_queue_capacity: DEFAULT_INITIAL_QUEUE_CAPACITY,
            max_message_size: MAX_UDP_PAYLOAD,
            grace_ms: 5_000,
            bus_capacity: 1024,
            recv_backoff: BackoffPolicy::default(),
        }
    }
}

impl DriverConfig {
    /// Reads `UDPCAST_*` variables over the defaults, then validates.
    pub fn from_env() -> Result<Self, DriverError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DriverError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut cfg = Self::default();

        if let Some(addr) = var("ADDR") {
            cfg.addr = addr;
        }
        override_parsed(&mut cfg.port, "PORT", var("PORT"))?;
        override_parsed(&mut cfg.max_queue_size, "MAX_QUEUE_SIZE", var("MAX_QUEUE_SIZE"))?;
        override_parsed(
            &mut cfg.initial_queue_capacity,
            "INITIAL_QUEUE_CAPACITY",
            var("INITIAL_QUEUE_CAPACITY"),
        )?;
        override_parsed(&mut cfg.max_message_size, "MAX_MESSAGE_SIZE", var("MAX_MESSAGE_SIZE"))?;
        override_parsed(&mut cfg.grace_ms, "GRACE_MS", var("GRACE_MS"))?;
        override_parsed(&mut cfg.bus_capacity, "BUS_CAPACITY", var("BUS_CAPACITY"))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values the driver cannot run with.
    pub fn validate(&self) -> Result<(), DriverError> {
        self.broadcast_ip()?;
        if !(1..=MAX_UDP_PAYLOAD).contains(&self.max_message_size) {
            return Err(DriverError::Config {
                reason: format!(
                    "max_message_size must be within 1..={MAX_UDP_PAYLOAD}, got {}",
                    self.max_message_size
                ),
            });
        }
        Ok(())
    }

    /// Parsed broadcast destination.
    pub fn broadcast_ip(&self) -> Result<Ipv4Addr, DriverError> {
        Ipv4Addr::from_str(self.addr.trim()).map_err(|e| DriverError::InvalidAddress {
            addr: self.addr.clone(),
            reason: e.to_string(),
        })
    }

    #[inline]
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Queue ceiling, at least 1.
    #[inline]
    pub fn queue_ceiling(&self) -> usize {
        self.max_queue_size.max(1)
    }

    /// Initial queue capacity within `1..=queue_ceiling()`.
    #[inline]
    pub fn initial_capacity_clamped(&self) -> usize {
        self.initial_queue_capacity.clamp(1, self.queue_ceiling())
    }

    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

fn override_parsed<T: FromStr>(
    slot: &mut T,
    name: &str,
    raw: Option<String>,
) -> Result<(), DriverError>
where
    T::Err: std::fmt::Display,
{
    if let Some(raw) = raw {
        *slot = raw.trim().parse().map_err(|e: T::Err| DriverError::Config {
            reason: format!("{ENV_PREFIX}{name}={raw:?}: {e}"),
        })?;
    }
    Ok(())
}
