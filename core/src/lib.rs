//! # Hotel Booking Core
//!
//! Pure domain logic for booking countable hotel inventory against date ranges.
//!
//! This crate provides the building blocks that the runtime crate wires together:
//!
//! - **Types**: identifiers, [`Money`](types::Money), [`StayDates`](types::StayDates),
//!   room types, reservations and payments
//! - **Overlap engine**: peak concurrent occupancy of a room type across a stay
//! - **Availability**: free units for a stay, given capacity and active reservations
//! - **Lifecycle**: the reservation state machine and the side effects of each edge
//! - **Refunds**: pluggable refund policies keyed on cancellation lead time
//! - **Bridge**: the narrow contract consumed from the payment provider
//! - **Environment**: injected dependencies such as the [`Clock`](environment::Clock)
//!
//! Nothing in this crate performs I/O or takes locks. Every function is
//! deterministic given its inputs, which keeps the inventory rules testable in
//! isolation from the concurrency discipline layered on top of them.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use hotel_booking_core::overlap::peak_occupancy;
//! use hotel_booking_core::types::StayDates;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
//! let window = StayDates::new(day(1), day(5)).unwrap();
//! let existing = [
//!     StayDates::new(day(1), day(3)).unwrap(),
//!     StayDates::new(day(3), day(5)).unwrap(),
//! ];
//!
//! // Back-to-back stays never share a night.
//! assert_eq!(peak_occupancy(window, existing), 1);
//! ```

pub mod availability;
pub mod bridge;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod overlap;
pub mod refund;
pub mod types;

pub use availability::{Availability, AvailabilityCalculator, NightAvailability};
pub use bridge::{
    BridgeError, BridgeFuture, BridgeResult, PaymentIntent, PaymentSettlementBridge,
    RefundReceipt, SettlementEvent, SettlementOutcome,
};
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, BookingResult};
pub use lifecycle::{LifecycleEvent, ReservationStateMachine, SideEffect, Transition};
pub use refund::{RefundPolicy, RefundQuote, RefundTier, TieredRefundPolicy};
pub use types::*;
