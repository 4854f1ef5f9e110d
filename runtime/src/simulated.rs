//! Simulated payment provider for development and demos.
//!
//! Every intent is created and every refund is executed. In production this is
//! replaced by an adapter for a real provider.

use hotel_booking_core::bridge::{
    BridgeFuture, PaymentIntent, PaymentSettlementBridge, RefundReceipt,
};
use hotel_booking_core::types::{Money, ReservationId};
use std::sync::Arc;
use std::time::Duration;

/// Payment bridge that always succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedSettlementBridge {
    latency: Duration,
}

impl SimulatedSettlementBridge {
    /// Creates a bridge that answers immediately
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Creates a bridge that waits `latency` before every answer
    #[must_use]
    pub const fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    /// Shared handle, ready to hand to a coordinator
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentSettlementBridge> {
        Arc::new(Self::new())
    }
}

impl PaymentSettlementBridge for SimulatedSettlementBridge {
    fn create_intent(
        &self,
        reservation_id: ReservationId,
        amount: Money,
    ) -> BridgeFuture<PaymentIntent> {
        let latency = self.latency;
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let intent_id = format!("sim_pi_{}", uuid::Uuid::new_v4().simple());
            tracing::info!(
                reservation_id = %reservation_id,
                amount = amount.cents(),
                intent_id = %intent_id,
                "Simulated payment intent created"
            );
            Ok(PaymentIntent {
                client_secret: Some(format!("{intent_id}_secret")),
                intent_id,
            })
        })
    }

    fn refund(&self, intent_id: &str, amount: Money, reason: &str) -> BridgeFuture<RefundReceipt> {
        let latency = self.latency;
        let intent_id = intent_id.to_string();
        let reason = reason.to_string();
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let refund_id = format!("sim_re_{}", uuid::Uuid::new_v4().simple());
            tracing::info!(
                intent_id = %intent_id,
                amount = amount.cents(),
                refund_id = %refund_id,
                reason = %reason,
                "Simulated refund executed"
            );
            Ok(RefundReceipt { refund_id, amount })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn intents_and_refunds_succeed() {
        let bridge = SimulatedSettlementBridge::shared();
        let intent = bridge
            .create_intent(ReservationId::new(), Money::from_dollars(100))
            .await
            .unwrap();
        assert!(intent.intent_id.starts_with("sim_pi_"));
        assert!(intent.client_secret.is_some());

        let receipt = bridge
            .refund(&intent.intent_id, Money::from_dollars(40), "Change of plans")
            .await
            .unwrap();
        assert_eq!(receipt.amount, Money::from_dollars(40));
        assert!(receipt.refund_id.starts_with("sim_re_"));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_applied() {
        let bridge = SimulatedSettlementBridge::with_latency(Duration::from_millis(250));
        let started = tokio::time::Instant::now();
        bridge
            .create_intent(ReservationId::new(), Money::from_dollars(1))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
