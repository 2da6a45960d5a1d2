//! # Backoff between failed receives.
//!
//! The delay after the `n`-th consecutive failure (0-indexed) is
//! `first × factor^n`, clamped to `max`, then jittered. The base is derived
//! from the failure count alone, so jitter never compounds.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use udpcast::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(10),
//!     max: Duration::from_millis(100),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay_for(0), Duration::from_millis(10));
//! assert_eq!(backoff.delay_for(2), Duration::from_millis(40));
//! assert_eq!(backoff.delay_for(9), Duration::from_millis(100));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay schedule for consecutive receive failures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Upper bound on any delay.
    pub max: Duration,
    /// Growth per additional failure (`>= 1.0` to grow).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(10),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never waits. Useful when the transport already blocks.
    pub const fn immediate() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay to wait after the `failures`-th consecutive failure (0-indexed).
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exp = failures.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(first_ms: u64, max_ms: u64, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_doubling_until_cap() {
        let p = plain(10, 1000, 2.0);
        let got: Vec<_> = (0..9).map(|n| p.delay_for(n).as_millis()).collect();
        assert_eq!(got, vec![10, 20, 40, 80, 160, 320, 640, 1000, 1000]);
    }

    #[test]
    fn test_first_above_max_is_clamped() {
        assert_eq!(plain(5000, 100, 2.0).delay_for(0), Duration::from_millis(100));
    }

    #[test]
    fn test_overflowing_exponent_clamps() {
        assert_eq!(plain(10, 1000, 2.0).delay_for(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_immediate_never_waits() {
        let p = BackoffPolicy::immediate();
        assert_eq!(p.delay_for(0), Duration::ZERO);
        assert_eq!(p.delay_for(50), Duration::ZERO);
    }

    #[test]
    fn test_default_equal_jitter_stays_in_band() {
        let p = BackoffPolicy::default();
        for n in 0..12 {
            let base = (10.0 * 2f64.powi(n as i32)).min(1000.0) as u64;
            let d = p.delay_for(n);
            assert!(d >= Duration::from_millis(base / 2), "failure {n}: {d:?}");
            assert!(d <= Duration::from_millis(base), "failure {n}: {d:?}");
        }
    }
}
