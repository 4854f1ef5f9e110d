//! Hotel Booking Demo
//!
//! Walks through the booking lifecycle against the simulated payment provider:
//! - Availability search across room types
//! - Reservation → payment settlement → confirmation
//! - A sold-out rejection
//! - Cancellation with a policy-driven refund
//! - Check-in and check-out by staff
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --bin demo
//! ```

use anyhow::Context;
use chrono::{TimeDelta, Utc};
use hotel_booking_core::bridge::SettlementEvent;
use hotel_booking_core::lifecycle::LifecycleEvent;
use hotel_booking_core::types::{Caller, Money, RoomKind, RoomType, UserId};
use hotel_booking_runtime::metrics::install_prometheus_recorder;
use hotel_booking_runtime::{
    BookingConfig, BookingCoordinator, ReservationRequest, SimulatedSettlementBridge,
    spawn_expiry_sweeper,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BookingConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},hotel_booking_runtime=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics = install_prometheus_recorder().context("installing metrics recorder")?;

    println!("\n🏨 ============================================");
    println!("   Hotel Booking - Live Demo");
    println!("============================================\n");

    let twin = RoomType::new(
        "Standard Twin Room",
        RoomKind::Standard,
        Money::from_cents(12_999),
        2,
        10,
    )
    .with_amenities(["WiFi", "TV"]);
    let suite = RoomType::new(
        "Deluxe Ocean View Suite",
        RoomKind::Suite,
        Money::from_cents(29_999),
        4,
        1,
    )
    .with_description("Corner suite with a private balcony")
    .with_size_sqm(65)
    .with_amenities(["WiFi", "Minibar", "Ocean view"]);

    let bridge = Arc::new(SimulatedSettlementBridge::with_latency(Duration::from_millis(50)));
    let coordinator = BookingCoordinator::builder(bridge)
        .config(config.clone())
        .room_types([twin.clone(), suite.clone()])
        .build();

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let sweeper = spawn_expiry_sweeper(
        coordinator.clone(),
        config.expiry_sweep_interval(),
        shutdown_rx,
    );

    let today = Utc::now().date_naive();
    let check_in = today + TimeDelta::days(10);
    let check_out = check_in + TimeDelta::days(3);

    // Step 1: search
    println!("1️⃣  Searching rooms for {check_in} → {check_out}, 2 guests...");
    for availability in coordinator.available_room_types(check_in, check_out, 2)? {
        let room = coordinator.room_type(availability.room_type_id)?;
        println!(
            "   • {} ({}) {} free of {}",
            room.name, room.price_per_night, availability.available, availability.total_rooms
        );
    }
    println!();

    // Step 2: reserve and settle
    println!("2️⃣  Alice books the suite...");
    let alice = Caller::guest(UserId::new());
    let request = ReservationRequest::new(alice.user_id, suite.id, check_in, check_out, 2)
        .with_notes("Late arrival");
    let reservation = coordinator.reserve(request).await?;
    println!(
        "   ✓ Reservation {} ({}), total {}",
        reservation.id, reservation.status, reservation.total_amount
    );

    let confirmed = coordinator
        .handle_settlement(SettlementEvent::succeeded(reservation.id, reservation.total_amount))
        .await?;
    println!("   ✓ Payment settled, reservation {}\n", confirmed.status);

    // Step 3: sold out
    println!("3️⃣  Bob tries the same suite for an overlapping stay...");
    let bob = Caller::guest(UserId::new());
    let overlapping =
        ReservationRequest::new(bob.user_id, suite.id, check_in + TimeDelta::days(1), check_out, 2);
    match coordinator.reserve(overlapping).await {
        Ok(_) => println!("   ✗ Unexpectedly booked"),
        Err(error) => println!("   ✓ Rejected: {error}"),
    }
    println!();

    // Step 4: cancel with refund
    println!("4️⃣  Alice cancels...");
    if let Some(quote) = coordinator.refund_quote(reservation.id, &alice)? {
        println!("   • Quoted refund {} of {}", quote.amount, quote.settled);
    }
    let cancelled = coordinator
        .cancel(reservation.id, &alice, Some("Change of plans".to_string()))
        .await?;
    println!(
        "   ✓ Reservation {}, refunded {} (payment {})\n",
        cancelled.status, cancelled.payment.refunded_amount, cancelled.payment.status
    );

    // Step 5: staff lifecycle
    println!("5️⃣  Bob books a twin room, arrives and leaves...");
    let tomorrow = today + TimeDelta::days(1);
    let tonight = ReservationRequest::new(bob.user_id, twin.id, today, tomorrow, 1);
    let stay = coordinator.reserve(tonight).await?;
    coordinator
        .handle_settlement(SettlementEvent::succeeded(stay.id, stay.total_amount))
        .await?;
    let front_desk = Caller::manager(UserId::new());
    coordinator.transition(stay.id, &front_desk, LifecycleEvent::CheckIn).await?;
    let departed = coordinator
        .transition(stay.id, &front_desk, LifecycleEvent::CheckOut)
        .await?;
    println!("   ✓ Reservation {}\n", departed.status);

    let stats = coordinator.statistics(&front_desk)?;
    println!(
        "📊 {} reservations, captured {}, refunded {}",
        stats.total, stats.captured_revenue, stats.refunded
    );
    println!("\n{}", metrics.render());

    let _ = shutdown_tx.send(());
    sweeper.await.context("joining expiry sweeper")?;
    Ok(())
}
