//! Concurrency tests for the booking coordinator
//!
//! Many callers race for the same inventory; the number of successful bookings must
//! never exceed what the room type can hold on any night.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use futures::future::join_all;
use hotel_booking_core::bridge::SettlementEvent;
use hotel_booking_core::error::BookingError;
use hotel_booking_core::types::{RoomType, StayDates, UserId};
use hotel_booking_runtime::{BookingConfig, BookingCoordinator, ReservationRequest, RetryPolicy};
use hotel_booking_testing::fixtures::{day, guest, standard_room};
use hotel_booking_testing::{ScriptedBridge, init_tracing, test_clock};
use std::sync::Arc;
use std::time::Duration;

fn coordinator(bridge: &ScriptedBridge, rooms: Vec<RoomType>) -> BookingCoordinator {
    init_tracing();
    let mut config = BookingConfig::default();
    config.payment.schedule_timers = false;
    config.coordination.lock_timeout_ms = 10_000;
    BookingCoordinator::builder(bridge.shared())
        .config(config)
        .clock(Arc::new(test_clock()))
        .room_types(rooms)
        .build()
}

fn request(room: &RoomType, from: i64, to: i64) -> ReservationRequest {
    ReservationRequest::new(UserId::new(), room.id, day(from), day(to), 1)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn hundred_callers_one_unit_exactly_one_wins() {
    let bridge = ScriptedBridge::new();
    let room = standard_room(1);
    let coordinator = coordinator(&bridge, vec![room.clone()]);

    let tasks = (0..100).map(|_| {
        let coordinator = coordinator.clone();
        let request = request(&room, 10, 12);
        tokio::spawn(async move { coordinator.reserve(request).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(result, Err(BookingError::CapacityExceeded { .. })),
            "unexpected outcome: {result:?}"
        );
    }
    assert_eq!(coordinator.available_units(room.id, day(10), day(12)).unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn overlapping_stays_never_exceed_capacity_on_any_night() {
    let bridge = ScriptedBridge::new();
    let room = standard_room(3);
    let coordinator = coordinator(&bridge, vec![room.clone()]);

    // Staggered stays across days 1..=12, many sharing nights.
    let tasks = (0..50).map(|i| {
        let coordinator = coordinator.clone();
        let start = 1 + i % 8;
        let request = request(&room, start, start + 1 + i % 4);
        tokio::spawn(async move { coordinator.reserve(request).await })
    });
    let booked: Vec<StayDates> = join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| joined.expect("task panicked").ok())
        .map(|reservation| reservation.stay)
        .collect();
    assert!(!booked.is_empty());

    for offset in 1..=12 {
        let night = day(offset);
        let occupied = booked.iter().filter(|stay| stay.contains_night(night)).count();
        assert!(occupied <= 3, "night {night} sold {occupied} units");
    }

    let availability = coordinator.availability(room.id, day(1), day(13), 1).unwrap();
    for night in availability.nights.unwrap() {
        let expected = booked.iter().filter(|stay| stay.contains_night(night.night)).count();
        assert_eq!(night.occupied as usize, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_callers_overlapping_ranges_single_unit() {
    let bridge = ScriptedBridge::new();
    let room = standard_room(1);
    let coordinator = coordinator(&bridge, vec![room.clone()]);

    let first = {
        let coordinator = coordinator.clone();
        let request = request(&room, 9, 11);
        tokio::spawn(async move { coordinator.reserve(request).await })
    };
    let second = {
        let coordinator = coordinator.clone();
        let request = request(&room, 10, 12);
        tokio::spawn(async move { coordinator.reserve(request).await })
    };
    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(BookingError::CapacityExceeded { .. })))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_room_types_book_independently() {
    let bridge = ScriptedBridge::new();
    let rooms: Vec<RoomType> = (0..5).map(|_| standard_room(4)).collect();
    let coordinator = coordinator(&bridge, rooms.clone());

    let mut tasks = Vec::new();
    for room in &rooms {
        for _ in 0..4 {
            let coordinator = coordinator.clone();
            let request = request(room, 3, 5);
            tasks.push(tokio::spawn(async move { coordinator.reserve(request).await }));
        }
    }
    let results = join_all(tasks).await;

    assert!(results.into_iter().all(|joined| joined.unwrap().is_ok()));
    for room in &rooms {
        assert_eq!(coordinator.available_units(room.id, day(3), day(5)).unwrap(), 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancel_and_settlement_leave_consistent_state() {
    let bridge = ScriptedBridge::new();
    let room = standard_room(1);
    let coordinator = coordinator(&bridge, vec![room.clone()]);
    let owner = guest();

    for _ in 0..20 {
        let reservation = coordinator
            .reserve(ReservationRequest::new(owner.user_id, room.id, day(20), day(21), 1))
            .await
            .unwrap();

        let settle = {
            let coordinator = coordinator.clone();
            let event = SettlementEvent::succeeded(reservation.id, reservation.total_amount);
            tokio::spawn(async move { coordinator.handle_settlement(event).await })
        };
        let cancel = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.cancel(reservation.id, &owner, None).await })
        };
        let (settled, cancelled) = (settle.await.unwrap(), cancel.await.unwrap());
        assert!(cancelled.is_ok(), "cancel failed: {cancelled:?}");

        let final_state = coordinator.reservation(reservation.id, &owner).unwrap();
        assert!(!final_state.holds_inventory());
        if settled.is_ok() {
            // Paid before the cancel committed, so it was refunded in full.
            assert_eq!(final_state.payment.refunded_amount, reservation.total_amount);
        } else {
            assert!(matches!(settled, Err(BookingError::InvalidStatusTransition { .. })));
            assert!(final_state.payment.refunded_amount.is_zero());
        }
        assert_eq!(coordinator.available_units(room.id, day(20), day(21)).unwrap(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn slot_held_by_slow_refund_reports_busy_then_retry_succeeds() {
    let bridge = ScriptedBridge::new();
    let room = standard_room(2);
    let mut config = BookingConfig::default();
    config.payment.schedule_timers = false;
    config.coordination.lock_timeout_ms = 100;
    let coordinator = BookingCoordinator::builder(bridge.shared())
        .config(config)
        .clock(Arc::new(test_clock()))
        .room_type(room.clone())
        .build();

    let owner = guest();
    let reservation = coordinator
        .reserve(ReservationRequest::new(owner.user_id, room.id, day(10), day(12), 1))
        .await
        .unwrap();
    coordinator
        .handle_settlement(SettlementEvent::succeeded(reservation.id, reservation.total_amount))
        .await
        .unwrap();

    bridge.delay_refunds(Duration::from_secs(1));
    let cancel = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.cancel(reservation.id, &owner, None).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let busy = coordinator.reserve(request(&room, 10, 11)).await;
    assert_eq!(busy, Err(BookingError::Busy { room_type_id: room.id }));

    let policy = RetryPolicy::builder()
        .max_retries(20)
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_millis(200))
        .build();
    let retried = coordinator.reserve_with_retry(request(&room, 10, 11), policy).await;
    assert!(retried.is_ok(), "retry failed: {retried:?}");

    assert!(cancel.await.unwrap().is_ok());
}
