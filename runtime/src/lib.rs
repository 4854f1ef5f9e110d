//! # Hotel Booking Runtime
//!
//! Stateful side of the hotel booking core: the [`BookingCoordinator`] that serializes
//! inventory changes per room type, the in-memory reservation ledger, the cancellation
//! and refund flow, and background expiry of unpaid reservations.
//!
//! ## Core Components
//!
//! - **`BookingCoordinator`**: reserve, settle, cancel and check guests in or out
//!   without ever selling more units than exist
//! - **`ReservationLedger`**: reservation records with per-room-type active indexes
//! - **`RoomSlots`**: one bounded-wait coordination slot per room type
//! - **`CancellationRefundFlow`**: refund through the payment bridge, then commit
//! - **`spawn_expiry_sweeper`**: periodic expiry of reservations left unpaid
//!
//! ## Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use hotel_booking_core::bridge::SettlementEvent;
//! use hotel_booking_core::types::{Money, RoomKind, RoomType, UserId};
//! use hotel_booking_runtime::{BookingCoordinator, ReservationRequest, SimulatedSettlementBridge};
//!
//! # async fn example() -> Result<(), hotel_booking_core::BookingError> {
//! let suite = RoomType::new("Garden Suite", RoomKind::Suite, Money::from_dollars(250), 3, 2);
//! let coordinator = BookingCoordinator::builder(SimulatedSettlementBridge::shared())
//!     .room_type(suite.clone())
//!     .build();
//!
//! let request = ReservationRequest::new(
//!     UserId::new(),
//!     suite.id,
//!     NaiveDate::from_ymd_opt(2030, 6, 1).unwrap_or_default(),
//!     NaiveDate::from_ymd_opt(2030, 6, 4).unwrap_or_default(),
//!     2,
//! );
//! let reservation = coordinator.reserve(request).await?;
//!
//! // Later, when the provider reports the charge:
//! coordinator
//!     .handle_settlement(SettlementEvent::succeeded(reservation.id, reservation.total_amount))
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Room type catalog
pub mod catalog;

/// Configuration loaded from environment variables
pub mod config;

/// The booking coordinator
pub mod coordinator;

/// Reservation store and indexes
pub mod ledger;

/// Prometheus metrics for observability
pub mod metrics;

/// Cancellation with refund execution
pub mod refund_flow;

/// Retry logic with exponential backoff
pub mod retry;

/// Always-succeeding payment provider
pub mod simulated;

/// Per-room-type coordination slots
pub mod slots;

/// Background payment expiry
pub mod timeouts;

pub use catalog::RoomCatalog;
pub use config::BookingConfig;
pub use coordinator::{BookingCoordinator, BookingCoordinatorBuilder, ReservationRequest};
pub use ledger::{ReservationLedger, ReservationStatistics};
pub use refund_flow::{Cancellation, CancellationRefundFlow};
pub use retry::RetryPolicy;
pub use simulated::SimulatedSettlementBridge;
pub use slots::{RoomSlots, SlotGuard};
pub use timeouts::spawn_expiry_sweeper;
