//! Business metrics for the booking runtime.
//!
//! Recorded through the `metrics` facade, so they are no-ops until a recorder is
//! installed. [`install_prometheus_recorder`] installs the Prometheus recorder and
//! returns a handle that renders the text exposition format; serving it over HTTP is
//! left to the host application.
//!
//! # Example
//!
//! ```rust,no_run
//! use hotel_booking_runtime::metrics::install_prometheus_recorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = install_prometheus_recorder()?;
//! // ... run bookings ...
//! println!("{}", handle.render());
//! # Ok(())
//! # }
//! ```

use hotel_booking_core::types::{Money, PaymentStatus};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

const SLOT_WAIT_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Installs a global Prometheus recorder and registers metric descriptions.
///
/// # Errors
///
/// Returns error if the recorder cannot be built or a global recorder is already
/// installed.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Suffix("wait_seconds".to_string()), SLOT_WAIT_BUCKETS)
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    Ok(handle)
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "hotel_reservations_total",
        "Reservation lifecycle transitions by resulting status"
    );
    describe_counter!(
        "hotel_booking_rejections_total",
        "Reservation attempts rejected, by reason"
    );
    describe_counter!(
        "hotel_refunds_cents_total",
        "Total amount refunded to guests, in cents"
    );
    describe_counter!(
        "hotel_payments_total",
        "Payment status changes by resulting status"
    );
    describe_histogram!(
        "hotel_slot_wait_seconds",
        "Time spent waiting for a room type's coordination slot"
    );
}

/// Why a reservation attempt was turned away
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Sold out on at least one night
    Capacity,
    /// Slot not acquired in time
    Busy,
    /// Bad dates, guest count or room type
    Validation,
}

impl Rejection {
    const fn label(self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Busy => "busy",
            Self::Validation => "validation",
        }
    }
}

/// Booking metrics recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// Record a reservation reaching `status` (`created`, `confirmed`, `expired`, ...)
    pub fn record_reservation(status: &'static str) {
        counter!("hotel_reservations_total", "status" => status).increment(1);
    }

    /// Record a rejected reservation attempt
    pub fn record_rejection(reason: Rejection) {
        counter!("hotel_booking_rejections_total", "reason" => reason.label()).increment(1);
    }

    /// Record an executed refund
    pub fn record_refund(amount: Money) {
        counter!("hotel_refunds_cents_total").increment(amount.cents());
    }

    /// Record a payment status change
    pub fn record_payment(status: PaymentStatus) {
        let status = match status {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        counter!("hotel_payments_total", "status" => status).increment(1);
    }

    /// Record time spent waiting for a coordination slot
    pub fn record_slot_wait(waited: Duration) {
        histogram!("hotel_slot_wait_seconds").record(waited.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_metrics_render_with_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_metrics();
            BookingMetrics::record_reservation("created");
            BookingMetrics::record_rejection(Rejection::Capacity);
            BookingMetrics::record_refund(Money::from_cents(7_500));
            BookingMetrics::record_payment(PaymentStatus::Refunded);
        });

        let rendered = handle.render();
        assert!(rendered.contains("hotel_reservations_total{status=\"created\"} 1"));
        assert!(rendered.contains("hotel_booking_rejections_total{reason=\"capacity\"} 1"));
        assert!(rendered.contains("hotel_refunds_cents_total 7500"));
        assert!(rendered.contains("hotel_payments_total{status=\"refunded\"} 1"));
    }
}
