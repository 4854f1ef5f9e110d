//! Configuration management for the booking runtime.
//!
//! Loads configuration from environment variables with sensible defaults.

use hotel_booking_core::refund::TieredRefundPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Coordination slot and bridge timeouts
    pub coordination: CoordinationConfig,
    /// Payment window and expiry scheduling
    pub payment: PaymentConfig,
    /// Refund policy parameters
    pub refund: RefundConfig,
    /// Reason recorded when a cancellation does not supply one
    pub default_cancellation_reason: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Coordination configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Maximum wait for a room type's slot, in milliseconds, before failing with `Busy`
    pub lock_timeout_ms: u64,
    /// Maximum wait for a payment provider call, in milliseconds
    pub bridge_timeout_ms: u64,
}

/// Payment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Seconds a reservation may stay in `PENDING_PAYMENT` before it expires
    pub timeout_secs: u64,
    /// Seconds between expiry sweeps
    pub expiry_sweep_interval_secs: u64,
    /// Whether each reservation gets its own expiry timer (the sweeper runs regardless)
    pub schedule_timers: bool,
}

/// Refund configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundConfig {
    /// Notice, in hours, that earns a full refund
    pub full_notice_hours: i64,
    /// Notice, in hours, that earns a partial refund
    pub partial_notice_hours: i64,
    /// Percentage refunded with partial notice
    pub partial_percent: u8,
}

impl RefundConfig {
    /// Builds the tiered policy described by this configuration
    #[must_use]
    pub fn policy(&self) -> TieredRefundPolicy {
        TieredRefundPolicy::standard(
            self.full_notice_hours,
            self.partial_notice_hours,
            self.partial_percent,
        )
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            coordination: CoordinationConfig {
                lock_timeout_ms: parse_or(&lookup, "BOOKING_LOCK_TIMEOUT_MS", 2_000),
                bridge_timeout_ms: parse_or(&lookup, "BOOKING_BRIDGE_TIMEOUT_MS", 5_000),
            },
            payment: PaymentConfig {
                timeout_secs: parse_or(&lookup, "BOOKING_PAYMENT_TIMEOUT_SECS", 900),
                expiry_sweep_interval_secs: parse_or(
                    &lookup,
                    "BOOKING_EXPIRY_SWEEP_INTERVAL_SECS",
                    60,
                ),
                schedule_timers: parse_or(&lookup, "BOOKING_SCHEDULE_PAYMENT_TIMERS", true),
            },
            refund: RefundConfig {
                full_notice_hours: parse_or(&lookup, "REFUND_FULL_NOTICE_HOURS", 72),
                partial_notice_hours: parse_or(&lookup, "REFUND_PARTIAL_NOTICE_HOURS", 24),
                partial_percent: parse_or(&lookup, "REFUND_PARTIAL_PERCENT", 50),
            },
            default_cancellation_reason: lookup("BOOKING_DEFAULT_CANCELLATION_REASON")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "User requested cancellation".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Slot acquisition timeout
    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.coordination.lock_timeout_ms)
    }

    /// Payment provider call timeout
    #[must_use]
    pub const fn bridge_timeout(&self) -> Duration {
        Duration::from_millis(self.coordination.bridge_timeout_ms)
    }

    /// How long a reservation may wait for settlement
    #[must_use]
    pub const fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment.timeout_secs)
    }

    /// Interval between expiry sweeps
    #[must_use]
    pub const fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.payment.expiry_sweep_interval_secs)
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
