//! # Hotel Booking Testing
//!
//! Testing utilities for the hotel booking core.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - A scriptable payment bridge that records calls and fails on demand
//! - Fixtures for room types, callers and dates
//! - proptest strategies for stays
//!
//! ## Example
//!
//! ```
//! use hotel_booking_testing::{fixtures, test_clock};
//! use hotel_booking_core::environment::Clock;
//!
//! let clock = test_clock();
//! assert_eq!(clock.today(), fixtures::day(0));
//! ```

use chrono::{DateTime, Utc};
use hotel_booking_core::environment::Clock;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::TimeDelta;
    use parking_lot::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use hotel_booking_testing::mocks::FixedClock;
    /// use hotel_booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Moves the clock forward by `by`
        pub fn advance(&self, by: TimeDelta) {
            let mut time = self.time.lock();
            *time += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_instant())
    }

    /// The instant [`test_clock`] is fixed at
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is hardcoded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_instant() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }
}

/// Scriptable payment bridge
pub mod bridge {
    use hotel_booking_core::bridge::{
        BridgeError, BridgeFuture, PaymentIntent, PaymentSettlementBridge, RefundReceipt,
    };
    use hotel_booking_core::types::{Money, ReservationId};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// A refund the bridge was asked to execute
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct RefundCall {
        /// Intent being refunded
        pub intent_id: String,
        /// Amount requested
        pub amount: Money,
        /// Reason passed along to the provider
        pub reason: String,
    }

    #[derive(Debug, Default)]
    struct Script {
        fail_intents: Option<BridgeError>,
        fail_refunds: Option<BridgeError>,
        intent_delay: Duration,
        refund_delay: Duration,
        intents: Vec<(ReservationId, Money)>,
        refunds: Vec<RefundCall>,
    }

    /// Payment bridge whose answers are set by the test.
    ///
    /// Succeeds by default and records every call. Clones share the same script.
    #[derive(Clone, Debug, Default)]
    pub struct ScriptedBridge {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedBridge {
        /// Creates a bridge that accepts everything
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Upcast for handing to a coordinator
        #[must_use]
        pub fn shared(&self) -> Arc<dyn PaymentSettlementBridge> {
            Arc::new(self.clone())
        }

        /// Makes intent creation fail with `error` (or succeed again with `None`)
        pub fn fail_intents(&self, error: Option<BridgeError>) {
            self.script.lock().fail_intents = error;
        }

        /// Makes refunds fail with `error` (or succeed again with `None`)
        pub fn fail_refunds(&self, error: Option<BridgeError>) {
            self.script.lock().fail_refunds = error;
        }

        /// Delays every intent creation by `delay`
        pub fn delay_intents(&self, delay: Duration) {
            self.script.lock().intent_delay = delay;
        }

        /// Delays every refund by `delay`
        pub fn delay_refunds(&self, delay: Duration) {
            self.script.lock().refund_delay = delay;
        }

        /// Intents requested so far
        #[must_use]
        pub fn intents(&self) -> Vec<(ReservationId, Money)> {
            self.script.lock().intents.clone()
        }

        /// Refunds requested so far, including failed ones
        #[must_use]
        pub fn refunds(&self) -> Vec<RefundCall> {
            self.script.lock().refunds.clone()
        }
    }

    impl PaymentSettlementBridge for ScriptedBridge {
        fn create_intent(
            &self,
            reservation_id: ReservationId,
            amount: Money,
        ) -> BridgeFuture<PaymentIntent> {
            let (outcome, delay) = {
                let mut script = self.script.lock();
                script.intents.push((reservation_id, amount));
                let outcome = match &script.fail_intents {
                    Some(error) => Err(error.clone()),
                    None => Ok(PaymentIntent {
                        intent_id: format!("pi_{}", script.intents.len()),
                        client_secret: None,
                    }),
                };
                (outcome, script.intent_delay)
            };
            tracing::debug!(
                reservation_id = %reservation_id,
                ok = outcome.is_ok(),
                "Scripted intent"
            );
            Box::pin(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                outcome
            })
        }

        fn refund(
            &self,
            intent_id: &str,
            amount: Money,
            reason: &str,
        ) -> BridgeFuture<RefundReceipt> {
            let (outcome, delay) = {
                let mut script = self.script.lock();
                script.refunds.push(RefundCall {
                    intent_id: intent_id.to_string(),
                    amount,
                    reason: reason.to_string(),
                });
                let outcome = match &script.fail_refunds {
                    Some(error) => Err(error.clone()),
                    None => Ok(RefundReceipt {
                        refund_id: format!("re_{}", script.refunds.len()),
                        amount,
                    }),
                };
                (outcome, script.refund_delay)
            };
            tracing::debug!(intent_id = %intent_id, amount = amount.cents(), "Scripted refund");
            Box::pin(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                outcome
            })
        }
    }
}

/// Ready-made room types, callers and dates
pub mod fixtures {
    use chrono::{NaiveDate, TimeDelta};
    use hotel_booking_core::types::{Caller, Money, RoomKind, RoomType, UserId};

    /// The date `offset` days after the test clock's date (2025-01-01)
    #[must_use]
    pub fn day(offset: i64) -> NaiveDate {
        super::mocks::test_instant().date_naive() + TimeDelta::days(offset)
    }

    /// $200/night standard room for two
    #[must_use]
    pub fn standard_room(total_rooms: u32) -> RoomType {
        RoomType::new(
            "Standard Queen Room",
            RoomKind::Standard,
            Money::from_dollars(200),
            2,
            total_rooms,
        )
    }

    /// $300/night suite for four
    #[must_use]
    pub fn suite(total_rooms: u32) -> RoomType {
        RoomType::new(
            "Harbour Suite",
            RoomKind::Suite,
            Money::from_dollars(300),
            4,
            total_rooms,
        )
        .with_amenities(["WiFi", "Minibar"])
    }

    /// A fresh guest
    #[must_use]
    pub fn guest() -> Caller {
        Caller::guest(UserId::new())
    }

    /// A fresh manager
    #[must_use]
    pub fn manager() -> Caller {
        Caller::manager(UserId::new())
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use super::fixtures::day;
    use hotel_booking_core::types::StayDates;
    use proptest::prelude::*;

    /// Stays starting within `horizon` days of the test date, up to `max_nights` long
    pub fn stay_strategy(horizon: i64, max_nights: i64) -> impl Strategy<Value = StayDates> {
        (0..horizon, 1..=max_nights).prop_filter_map("valid stay", |(start, nights)| {
            StayDates::new(day(start), day(start + nights)).ok()
        })
    }
}

/// Installs a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use bridge::ScriptedBridge;
pub use mocks::{FixedClock, ManualClock, test_clock};
