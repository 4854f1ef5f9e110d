//! Reservation state machine.
//!
//! ```text
//! PENDING_PAYMENT ──paid──▶ CONFIRMED ──check-in──▶ CHECKED_IN ──check-out──▶ CHECKED_OUT
//!        │                      │                        │
//!        │ payment failed       │ cancel request         │ cancel request
//!        │ or timed out,        │                        │
//!        │ cancel request       │                        │
//!        └─────────────────────▶ CANCELLED ◀─────────────┘
//! ```
//!
//! Every status change goes through [`ReservationStateMachine`]. A rejected event
//! leaves the reservation untouched and yields
//! [`BookingError::InvalidStatusTransition`]; an accepted one reports the side effects
//! the caller must carry out alongside the status change.

use crate::error::BookingError;
use crate::types::{PaymentStatus, Reservation, ReservationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Inputs that drive the reservation lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The settlement bridge captured the payment
    PaymentSucceeded,
    /// The settlement bridge reported a failed payment
    PaymentFailed,
    /// No settlement arrived within the payment window
    PaymentTimedOut,
    /// Guest or staff asked to cancel
    CancelRequested,
    /// Guest arrived (staff only)
    CheckIn,
    /// Guest left (staff only)
    CheckOut,
}

impl LifecycleEvent {
    /// All events
    pub const ALL: [Self; 6] = [
        Self::PaymentSucceeded,
        Self::PaymentFailed,
        Self::PaymentTimedOut,
        Self::CancelRequested,
        Self::CheckIn,
        Self::CheckOut,
    ];

    /// Events only staff may submit
    #[must_use]
    pub const fn requires_privilege(self) -> bool {
        matches!(self, Self::CheckIn | Self::CheckOut)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PaymentSucceeded => "payment succeeded",
            Self::PaymentFailed => "payment failed",
            Self::PaymentTimedOut => "payment timeout",
            Self::CancelRequested => "cancel request",
            Self::CheckIn => "check-in",
            Self::CheckOut => "check-out",
        })
    }
}

/// Work that must accompany a status change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideEffect {
    /// The inventory unit held by the reservation returns to the pool
    ReleaseInventory,
    /// A refund must be computed and, if non-zero, executed before committing
    EvaluateRefund,
}

/// An accepted status change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Status before
    pub from: ReservationStatus,
    /// Status after
    pub to: ReservationStatus,
    /// Event that caused it
    pub event: LifecycleEvent,
    /// Side effects the caller is responsible for
    pub effects: SmallVec<[SideEffect; 2]>,
}

impl Transition {
    /// Whether `effect` accompanies this transition
    #[must_use]
    pub fn has_effect(&self, effect: SideEffect) -> bool {
        self.effects.contains(&effect)
    }
}

/// The reservation lifecycle rules
#[derive(Clone, Copy, Debug, Default)]
pub struct ReservationStateMachine;

impl ReservationStateMachine {
    /// Creates a new `ReservationStateMachine`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Looks up the edge for `event` from `from`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidStatusTransition`] if no such edge exists.
    pub fn transition(
        &self,
        from: ReservationStatus,
        event: LifecycleEvent,
    ) -> Result<Transition, BookingError> {
        use LifecycleEvent as E;
        use ReservationStatus as S;

        let (to, effects): (S, SmallVec<[SideEffect; 2]>) = match (from, event) {
            (S::PendingPayment, E::PaymentSucceeded) => (S::Confirmed, SmallVec::new()),
            (S::PendingPayment, E::PaymentFailed | E::PaymentTimedOut | E::CancelRequested) => {
                (S::Cancelled, smallvec![SideEffect::ReleaseInventory])
            }
            (S::Confirmed | S::CheckedIn, E::CancelRequested) => (
                S::Cancelled,
                smallvec![SideEffect::ReleaseInventory, SideEffect::EvaluateRefund],
            ),
            (S::Confirmed, E::CheckIn) => (S::CheckedIn, SmallVec::new()),
            (S::CheckedIn, E::CheckOut) => (S::CheckedOut, SmallVec::new()),
            _ => return Err(BookingError::InvalidStatusTransition { from, event }),
        };

        Ok(Transition {
            from,
            to,
            event,
            effects,
        })
    }

    /// Whether `event` is accepted from `from`
    #[must_use]
    pub fn permits(&self, from: ReservationStatus, event: LifecycleEvent) -> bool {
        self.transition(from, event).is_ok()
    }

    /// Applies `event` to `reservation`, updating its status and timestamps.
    ///
    /// Payment status is the caller's responsibility because it depends on what the
    /// settlement bridge actually did.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidStatusTransition`] and leaves `reservation`
    /// unchanged if the event is not allowed from its current status.
    pub fn apply(
        &self,
        reservation: &mut Reservation,
        event: LifecycleEvent,
        at: DateTime<Utc>,
    ) -> Result<Transition, BookingError> {
        let transition = self.transition(reservation.status, event)?;
        reservation.status = transition.to;
        reservation.updated_at = at;
        if transition.to == ReservationStatus::Cancelled {
            reservation.cancelled_at = Some(at);
        }
        Ok(transition)
    }
}

/// Payment status that accompanies a settlement-driven transition
#[must_use]
pub const fn payment_status_after(event: LifecycleEvent) -> Option<PaymentStatus> {
    match event {
        LifecycleEvent::PaymentSucceeded => Some(PaymentStatus::Succeeded),
        LifecycleEvent::PaymentFailed | LifecycleEvent::PaymentTimedOut => {
            Some(PaymentStatus::Failed)
        }
        LifecycleEvent::CancelRequested | LifecycleEvent::CheckIn | LifecycleEvent::CheckOut => {
            None
        }
    }
}
