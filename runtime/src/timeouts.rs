//! Background expiry of unpaid reservations.
//!
//! Each reservation normally gets its own timer when it is created. The sweeper is the
//! safety net: it periodically expires anything whose payment window has passed, for
//! example reservations whose timer could not take the slot.

use crate::coordinator::BookingCoordinator;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawns a task that calls [`BookingCoordinator::expire_stale_payments`] every
/// `interval` until a shutdown signal arrives.
///
/// # Example
///
/// ```no_run
/// # use hotel_booking_runtime::{BookingCoordinator, SimulatedSettlementBridge};
/// # use hotel_booking_runtime::timeouts::spawn_expiry_sweeper;
/// # use std::time::Duration;
/// # async fn example() {
/// let coordinator = BookingCoordinator::builder(SimulatedSettlementBridge::shared()).build();
/// let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
///
/// let sweeper = spawn_expiry_sweeper(coordinator, Duration::from_secs(60), shutdown_rx);
/// // ...
/// let _ = shutdown_tx.send(());
/// let _ = sweeper.await;
/// # }
/// ```
pub fn spawn_expiry_sweeper(
    coordinator: BookingCoordinator,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(interval_secs = interval.as_secs(), "Payment expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let expired = coordinator.expire_stale_payments().await;
                    if !expired.is_empty() {
                        tracing::info!(count = expired.len(), "Expired unpaid reservations");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Payment expiry sweeper shutting down");
                    break;
                }
            }
        }
    })
}
