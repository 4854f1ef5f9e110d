//! Error taxonomy for booking operations.
//!
//! Every error is scoped to the single request that produced it. Validation errors are
//! raised before any coordination slot is taken; `Busy` and `ConcurrentUpdate` are
//! transient and may be retried, everything else is a definitive answer.

use crate::lifecycle::LifecycleEvent;
use crate::types::{Money, ReservationId, ReservationStatus, RoomTypeId, UserId};
use chrono::NaiveDate;
use thiserror::Error;

/// Result alias for booking operations
pub type BookingResult<T> = Result<T, BookingError>;

/// Errors returned by availability, booking, lifecycle and refund operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The requested stay is empty, inverted or starts in the past
    #[error("Invalid date range {check_in}..{check_out}: {reason}")]
    InvalidDateRange {
        /// Requested check-in
        check_in: NaiveDate,
        /// Requested check-out
        check_out: NaiveDate,
        /// What is wrong with the range
        reason: String,
    },

    /// More guests than one unit of the room type accommodates
    #[error("Room type fits {capacity} guests, {requested} requested")]
    GuestCountExceeded {
        /// Requested number of guests
        requested: u32,
        /// Room type capacity
        capacity: u32,
    },

    /// A reservation must be for at least one guest
    #[error("At least one guest is required")]
    NoGuests,

    /// Unknown room type
    #[error("Room type {0} not found")]
    RoomNotFound(RoomTypeId),

    /// A room type with this id is already in the catalog
    #[error("Room type {0} already exists")]
    RoomTypeExists(RoomTypeId),

    /// The room type still has reservations holding inventory
    #[error("Room type {room_type_id} has {active} active reservations")]
    RoomTypeInUse {
        /// Room type that was to be removed
        room_type_id: RoomTypeId,
        /// Reservations still holding inventory
        active: usize,
    },

    /// The new inventory is smaller than the units already booked on some night
    #[error(
        "Room type {room_type_id} has {booked} units booked on its busiest night, \
         cannot shrink to {total_rooms}"
    )]
    InventoryBelowBookings {
        /// Room type being updated
        room_type_id: RoomTypeId,
        /// Requested number of units
        total_rooms: u32,
        /// Units held on the busiest upcoming night
        booked: u32,
    },

    /// Unknown reservation
    #[error("Reservation {0} not found")]
    ReservationNotFound(ReservationId),

    /// No unit is free on at least one night of the stay
    #[error("No units of room type {room_type_id} free for {check_in}..{check_out}")]
    CapacityExceeded {
        /// Room type that is sold out
        room_type_id: RoomTypeId,
        /// Requested check-in
        check_in: NaiveDate,
        /// Requested check-out
        check_out: NaiveDate,
    },

    /// The room type's coordination slot could not be acquired in time
    #[error("Room type {room_type_id} is busy, retry later")]
    Busy {
        /// Contended room type
        room_type_id: RoomTypeId,
    },

    /// The event is not allowed from the reservation's current status
    #[error("Cannot apply {event} to a reservation in status {from}")]
    InvalidStatusTransition {
        /// Current status
        from: ReservationStatus,
        /// Rejected event
        event: LifecycleEvent,
    },

    /// The payment provider did not execute the refund; nothing was changed
    #[error("Refund of {amount} failed: {reason}")]
    RefundFailed {
        /// Amount that was attempted
        amount: Money,
        /// Provider-reported reason
        reason: String,
    },

    /// The caller may not perform this operation
    #[error("User {user_id} is not allowed to {action}")]
    Unauthorized {
        /// Caller
        user_id: UserId,
        /// What was attempted
        action: &'static str,
    },

    /// The payment provider could not create an intent.
    ///
    /// The reservation is cancelled and its unit released, unless the room type stayed
    /// busy through every release attempt; the payment timeout then releases it.
    #[error("Payment intent for reservation {reservation_id} failed: {reason}")]
    PaymentIntentFailed {
        /// Reservation whose intent failed
        reservation_id: ReservationId,
        /// Provider-reported reason
        reason: String,
    },

    /// A settlement reported a different amount than the reservation total
    #[error("Settlement of {settled} does not match reservation total {expected}")]
    SettlementMismatch {
        /// Reservation total
        expected: Money,
        /// Amount reported by the provider
        settled: Money,
    },

    /// The reservation changed between planning and committing an update
    #[error("Reservation {0} was modified concurrently")]
    ConcurrentUpdate(ReservationId),
}

impl BookingError {
    /// Whether the same request may succeed if retried unchanged
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::ConcurrentUpdate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        let room_type_id = RoomTypeId::new();
        assert!(BookingError::Busy { room_type_id }.is_retryable());
        assert!(BookingError::ConcurrentUpdate(ReservationId::new()).is_retryable());
        assert!(!BookingError::RoomNotFound(room_type_id).is_retryable());
        assert!(
            !BookingError::CapacityExceeded {
                room_type_id,
                check_in: NaiveDate::MIN,
                check_out: NaiveDate::MAX,
            }
            .is_retryable()
        );
    }

    #[test]
    fn transition_error_names_status_and_event() {
        let error = BookingError::InvalidStatusTransition {
            from: ReservationStatus::Cancelled,
            event: LifecycleEvent::CancelRequested,
        };
        assert_eq!(
            error.to_string(),
            "Cannot apply cancel request to a reservation in status CANCELLED"
        );
    }
}
