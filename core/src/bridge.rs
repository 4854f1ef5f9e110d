//! Payment settlement bridge.
//!
//! The booking core never talks to a payment provider directly. It consumes this
//! narrow contract: create an intent when a reservation is placed, execute a refund
//! when a paid reservation is cancelled, and receive settlement outcomes as
//! [`SettlementEvent`]s fed into the coordinator by whatever adapter hosts the
//! provider's webhook.

use crate::types::{Money, ReservationId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Bridge result
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Boxed future returned by bridge calls
pub type BridgeFuture<T> = Pin<Box<dyn Future<Output = BridgeResult<T>> + Send>>;

/// Errors reported by the payment provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The provider refused the request
    #[error("Payment provider declined: {reason}")]
    Declined {
        /// Provider-reported reason
        reason: String,
    },

    /// The provider did not answer in time
    #[error("Payment provider timed out")]
    Timeout,

    /// The provider could not be reached
    #[error("Payment provider unavailable: {message}")]
    Unavailable {
        /// Transport-level detail
        message: String,
    },
}

/// A provider-side payment intent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider identifier, used later for refunds
    pub intent_id: String,
    /// Secret handed to the client to complete payment, if the provider issues one
    pub client_secret: Option<String>,
}

/// Confirmation of an executed refund
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// Provider identifier of the refund
    pub refund_id: String,
    /// Amount actually returned
    pub amount: Money,
}

/// How a payment settled
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Funds captured. `settled_amount` is checked against the reservation total
    /// when the provider reports it.
    Succeeded {
        /// Captured amount, if reported
        settled_amount: Option<Money>,
    },
    /// Payment failed
    Failed {
        /// Provider-reported reason
        reason: String,
    },
}

/// A settlement notification for one reservation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEvent {
    /// Reservation the payment belongs to
    pub reservation_id: ReservationId,
    /// What happened
    pub outcome: SettlementOutcome,
}

impl SettlementEvent {
    /// A successful settlement of `amount`
    #[must_use]
    pub const fn succeeded(reservation_id: ReservationId, amount: Money) -> Self {
        Self {
            reservation_id,
            outcome: SettlementOutcome::Succeeded {
                settled_amount: Some(amount),
            },
        }
    }

    /// A failed settlement
    #[must_use]
    pub fn failed(reservation_id: ReservationId, reason: impl Into<String>) -> Self {
        Self {
            reservation_id,
            outcome: SettlementOutcome::Failed {
                reason: reason.into(),
            },
        }
    }
}

/// Payment settlement bridge trait
///
/// Abstraction over payment processors. Implementations must be safe to call
/// concurrently.
pub trait PaymentSettlementBridge: Send + Sync {
    /// Create a payment intent for a newly placed reservation
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot create the intent
    fn create_intent(&self, reservation_id: ReservationId, amount: Money)
    -> BridgeFuture<PaymentIntent>;

    /// Refund part or all of a captured payment
    ///
    /// # Errors
    ///
    /// Returns error if the refund was not executed
    fn refund(&self, intent_id: &str, amount: Money, reason: &str) -> BridgeFuture<RefundReceipt>;
}
