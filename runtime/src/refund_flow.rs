//! Cancellation and refund flow.
//!
//! Cancelling a paid reservation means executing a refund with the payment provider
//! and flipping the reservation to `CANCELLED`. Both happen or neither does:
//!
//! 1. Read the reservation and look up the cancel edge in the state machine.
//! 2. If the edge carries [`SideEffect::EvaluateRefund`], quote the refund with the
//!    injected policy and execute it through the bridge (bounded by a timeout).
//!    A bridge failure returns [`BookingError::RefundFailed`] with nothing changed.
//! 3. Commit status, payment and cancellation fields in one ledger update, but only if
//!    the reservation is still in the state that was planned against.
//!
//! The caller holds the room type's slot throughout, so the only change that can slip
//! in between steps 1 and 3 is a settlement success on a `PENDING_PAYMENT`
//! reservation. That path never refunds, so the flow simply replans.

use crate::ledger::ReservationLedger;
use crate::metrics::BookingMetrics;
use chrono::{DateTime, Utc};
use hotel_booking_core::bridge::{PaymentSettlementBridge, RefundReceipt};
use hotel_booking_core::error::BookingError;
use hotel_booking_core::lifecycle::{LifecycleEvent, ReservationStateMachine, SideEffect};
use hotel_booking_core::refund::{RefundPolicy, RefundQuote};
use hotel_booking_core::types::{Money, PaymentStatus, Reservation, ReservationId};
use std::sync::Arc;
use std::time::Duration;

const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Result of a completed cancellation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cancellation {
    /// The reservation, now `CANCELLED`
    pub reservation: Reservation,
    /// Refund quote, if the reservation had been paid
    pub quote: Option<RefundQuote>,
    /// Provider receipt, if money was returned
    pub receipt: Option<RefundReceipt>,
}

impl Cancellation {
    /// Amount returned to the guest
    #[must_use]
    pub fn refunded(&self) -> Money {
        self.receipt.as_ref().map_or(Money::ZERO, |receipt| receipt.amount)
    }
}

/// Computes and executes refunds, and commits cancellations
pub struct CancellationRefundFlow {
    policy: Arc<dyn RefundPolicy>,
    bridge: Arc<dyn PaymentSettlementBridge>,
    bridge_timeout: Duration,
    machine: ReservationStateMachine,
}

impl std::fmt::Debug for CancellationRefundFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationRefundFlow")
            .field("bridge_timeout", &self.bridge_timeout)
            .finish_non_exhaustive()
    }
}

impl CancellationRefundFlow {
    /// Creates a flow using `policy` and `bridge`
    #[must_use]
    pub fn new(
        policy: Arc<dyn RefundPolicy>,
        bridge: Arc<dyn PaymentSettlementBridge>,
        bridge_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            bridge,
            bridge_timeout,
            machine: ReservationStateMachine::new(),
        }
    }

    /// Refund owed if `reservation` were cancelled at `now`.
    ///
    /// `None` when nothing has been captured.
    #[must_use]
    pub fn quote(&self, reservation: &Reservation, now: DateTime<Utc>) -> Option<RefundQuote> {
        let settled = reservation.payment.net_captured();
        (!settled.is_zero()).then(|| {
            RefundQuote::compute(self.policy.as_ref(), reservation.check_in(), now, settled)
        })
    }

    /// Cancels the reservation, refunding as the policy dictates.
    ///
    /// The caller must hold the reservation's room type slot.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`] for an unknown id
    /// - [`BookingError::InvalidStatusTransition`] if the reservation cannot be cancelled
    /// - [`BookingError::RefundFailed`] if the provider did not execute the refund
    /// - [`BookingError::ConcurrentUpdate`] if the reservation kept changing underneath
    pub async fn run(
        &self,
        ledger: &ReservationLedger,
        id: ReservationId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Cancellation, BookingError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let planned = ledger.get(id).ok_or(BookingError::ReservationNotFound(id))?;
            let transition = self
                .machine
                .transition(planned.status, LifecycleEvent::CancelRequested)?;

            let (quote, receipt) = if transition.has_effect(SideEffect::EvaluateRefund) {
                self.refund(&planned, reason, now).await?
            } else {
                (None, None)
            };

            let committed = ledger.update(id, |reservation| {
                if reservation.status != planned.status
                    || reservation.payment.status != planned.payment.status
                {
                    return Err(BookingError::ConcurrentUpdate(id));
                }
                self.machine
                    .apply(reservation, LifecycleEvent::CancelRequested, now)?;
                reservation.cancellation_reason = Some(reason.to_string());

                let payment = &mut reservation.payment;
                if let Some(receipt) = &receipt {
                    payment.status = PaymentStatus::Refunded;
                    payment.refunded_amount = payment
                        .refunded_amount
                        .saturating_add(receipt.amount)
                        .min(payment.amount);
                    payment.refund_id = Some(receipt.refund_id.clone());
                    payment.updated_at = now;
                } else if payment.status == PaymentStatus::Pending {
                    payment.status = PaymentStatus::Failed;
                    payment.updated_at = now;
                }
                Ok(())
            });

            match committed {
                Ok(reservation) => {
                    return Ok(Cancellation {
                        reservation,
                        quote,
                        receipt,
                    });
                }
                Err(BookingError::ConcurrentUpdate(_)) if receipt.is_none() => {
                    tracing::debug!(
                        reservation_id = %id,
                        attempt,
                        "Reservation changed while cancelling, replanning"
                    );
                }
                Err(error) => {
                    if let Some(receipt) = &receipt {
                        tracing::error!(
                            reservation_id = %id,
                            refund_id = %receipt.refund_id,
                            error = %error,
                            "Refund executed but cancellation could not be committed"
                        );
                    }
                    return Err(error);
                }
            }
        }

        Err(BookingError::ConcurrentUpdate(id))
    }

    async fn refund(
        &self,
        reservation: &Reservation,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(Option<RefundQuote>, Option<RefundReceipt>), BookingError> {
        let Some(quote) = self.quote(reservation, now) else {
            return Ok((None, None));
        };
        if quote.is_zero() {
            tracing::info!(
                reservation_id = %reservation.id,
                lead_hours = quote.lead_time.num_hours(),
                "No refund owed for cancellation"
            );
            return Ok((Some(quote), None));
        }

        let Some(intent_id) = reservation.payment.intent_id.as_deref() else {
            return Err(BookingError::RefundFailed {
                amount: quote.amount,
                reason: "payment has no provider intent".to_string(),
            });
        };

        let call = self.bridge.refund(intent_id, quote.amount, reason);
        let receipt = match tokio::time::timeout(self.bridge_timeout, call).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(error)) => {
                tracing::warn!(
                    reservation_id = %reservation.id,
                    amount = quote.amount.cents(),
                    error = %error,
                    "Refund rejected by payment provider"
                );
                return Err(BookingError::RefundFailed {
                    amount: quote.amount,
                    reason: error.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!(
                    reservation_id = %reservation.id,
                    amount = quote.amount.cents(),
                    "Refund timed out"
                );
                return Err(BookingError::RefundFailed {
                    amount: quote.amount,
                    reason: "payment provider timed out".to_string(),
                });
            }
        };

        let receipt = RefundReceipt {
            amount: receipt.amount.min(quote.amount),
            ..receipt
        };
        BookingMetrics::record_refund(receipt.amount);
        tracing::info!(
            reservation_id = %reservation.id,
            refund_id = %receipt.refund_id,
            amount = receipt.amount.cents(),
            "Refund executed"
        );
        Ok((Some(quote), Some(receipt)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hotel_booking_core::refund::TieredRefundPolicy;
    use hotel_booking_core::types::{RoomTypeId, StayDates, UserId};
    use hotel_booking_testing::fixtures::day;
    use hotel_booking_testing::mocks::test_instant;
    use hotel_booking_testing::ScriptedBridge;

    fn flow(bridge: &ScriptedBridge) -> CancellationRefundFlow {
        CancellationRefundFlow::new(
            Arc::new(TieredRefundPolicy::default()),
            bridge.shared(),
            Duration::from_secs(1),
        )
    }

    fn paid_reservation(check_in: i64) -> Reservation {
        let mut reservation = Reservation::pending(
            UserId::new(),
            RoomTypeId::new(),
            StayDates::new(day(check_in), day(check_in + 2)).unwrap(),
            2,
            Money::from_dollars(400),
            None,
            test_instant(),
        );
        reservation.status = hotel_booking_core::types::ReservationStatus::Confirmed;
        reservation.payment.status = PaymentStatus::Succeeded;
        reservation.payment.intent_id = Some("pi_test".to_string());
        reservation
    }

    #[test]
    fn nothing_to_quote_before_capture() {
        let flow = flow(&ScriptedBridge::new());
        let mut reservation = paid_reservation(10);
        reservation.payment.status = PaymentStatus::Pending;
        assert!(flow.quote(&reservation, test_instant()).is_none());
    }

    #[tokio::test]
    async fn late_cancellation_skips_the_bridge() {
        let bridge = ScriptedBridge::new();
        let ledger = ReservationLedger::new();
        let reservation = paid_reservation(0);
        ledger.insert(reservation.clone());

        let cancellation = flow(&bridge)
            .run(&ledger, reservation.id, "No show", test_instant())
            .await
            .unwrap();
        assert!(cancellation.quote.unwrap().is_zero());
        assert!(cancellation.receipt.is_none());
        assert_eq!(cancellation.refunded(), Money::ZERO);
        assert_eq!(cancellation.reservation.payment.status, PaymentStatus::Succeeded);
        assert!(bridge.refunds().is_empty());
        assert_eq!(ledger.active_count(reservation.room_type_id, day(0)), 0);
    }

    #[tokio::test]
    async fn missing_intent_fails_without_changes() {
        let bridge = ScriptedBridge::new();
        let ledger = ReservationLedger::new();
        let mut reservation = paid_reservation(10);
        reservation.payment.intent_id = None;
        ledger.insert(reservation.clone());

        let result = flow(&bridge)
            .run(&ledger, reservation.id, "Change of plans", test_instant())
            .await;
        assert!(matches!(result, Err(BookingError::RefundFailed { .. })));
        assert_eq!(ledger.get(reservation.id), Some(reservation));
    }
}
