//! Property tests: the coordinator accepts exactly the bookings that fit

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use hotel_booking_core::error::BookingError;
use hotel_booking_core::types::{StayDates, UserId};
use hotel_booking_runtime::{BookingConfig, BookingCoordinator, ReservationRequest};
use hotel_booking_testing::fixtures::standard_room;
use hotel_booking_testing::properties::stay_strategy;
use hotel_booking_testing::{ScriptedBridge, test_clock};
use proptest::prelude::*;
use std::sync::Arc;

fn fits(accepted: &[StayDates], candidate: StayDates, total_rooms: u32) -> bool {
    candidate.nights_iter().all(|night| {
        let occupied = accepted.iter().filter(|stay| stay.contains_night(night)).count();
        occupied < total_rooms as usize
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sequential_bookings_match_a_night_by_night_model(
        total_rooms in 1u32..4,
        stays in prop::collection::vec(stay_strategy(20, 5), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let room = standard_room(total_rooms);
        let mut config = BookingConfig::default();
        config.payment.schedule_timers = false;
        let coordinator = BookingCoordinator::builder(ScriptedBridge::new().shared())
            .config(config)
            .clock(Arc::new(test_clock()))
            .room_type(room.clone())
            .build();

        let mut accepted: Vec<StayDates> = Vec::new();
        for stay in stays {
            let expected = fits(&accepted, stay, total_rooms);
            let (check_in, check_out) = (stay.check_in(), stay.check_out());
            let request = ReservationRequest::new(UserId::new(), room.id, check_in, check_out, 1);
            let outcome = runtime.block_on(coordinator.reserve(request));

            if expected {
                prop_assert!(outcome.is_ok(), "{stay} should fit: {outcome:?}");
                accepted.push(stay);
            } else {
                let is_capacity = matches!(outcome, Err(BookingError::CapacityExceeded { .. }));
                prop_assert!(is_capacity, "{stay} should be sold out: {outcome:?}");
            }
        }
    }
}
