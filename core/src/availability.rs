//! Availability calculator.
//!
//! Wraps the overlap engine with room-type capacity: the number of free units for a
//! stay is `total_rooms` minus the peak occupancy of the active reservations over the
//! stay's nights. The caller supplies the active stays; deciding which reservations are
//! active (and reading them consistently) belongs to the runtime.

use crate::error::BookingError;
use crate::overlap::{nightly_occupancy, peak_occupancy};
use crate::types::{RoomType, RoomTypeId, StayDates};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Free units on one night
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAvailability {
    /// The night
    pub night: NaiveDate,
    /// Units held by active reservations
    pub occupied: u32,
    /// Units still free
    pub available: u32,
}

/// Availability of a room type for a stay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Room type queried
    pub room_type_id: RoomTypeId,
    /// Stay queried
    pub stay: StayDates,
    /// Inventory of the room type
    pub total_rooms: u32,
    /// Units held on the busiest night
    pub peak_occupied: u32,
    /// Units free on every night of the stay
    pub available: u32,
    /// Per-night breakdown, when requested
    pub nights: Option<Vec<NightAvailability>>,
}

impl Availability {
    /// Whether at least one unit can be booked for the whole stay
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available > 0
    }
}

/// Computes free units of a room type from its capacity and active stays
#[derive(Clone, Copy, Debug, Default)]
pub struct AvailabilityCalculator;

impl AvailabilityCalculator {
    /// Creates a new `AvailabilityCalculator`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Free units of `room_type` for every night of `stay`.
    #[must_use]
    pub fn available_units<I>(&self, room_type: &RoomType, stay: StayDates, active: I) -> u32
    where
        I: IntoIterator<Item = StayDates>,
    {
        room_type
            .total_rooms
            .saturating_sub(peak_occupancy(stay, active))
    }

    /// Free units for a raw date pair, validated against `today`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] if `check_out <= check_in` or
    /// `check_in` is before `today`.
    pub fn available_units_between<I>(
        &self,
        room_type: &RoomType,
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
        active: I,
    ) -> Result<u32, BookingError>
    where
        I: IntoIterator<Item = StayDates>,
    {
        let stay = StayDates::bookable(check_in, check_out, today)?;
        Ok(self.available_units(room_type, stay, active))
    }

    /// Full availability report, optionally with a per-night breakdown.
    #[must_use]
    pub fn availability(
        &self,
        room_type: &RoomType,
        stay: StayDates,
        active: &[StayDates],
        per_night: bool,
    ) -> Availability {
        let peak_occupied = peak_occupancy(stay, active.iter().copied());
        let nights = per_night.then(|| {
            nightly_occupancy(stay, active.iter().copied())
                .into_iter()
                .map(|n| NightAvailability {
                    night: n.night,
                    occupied: n.occupied,
                    available: room_type.total_rooms.saturating_sub(n.occupied),
                })
                .collect()
        });

        Availability {
            room_type_id: room_type.id,
            stay,
            total_rooms: room_type.total_rooms,
            peak_occupied,
            available: room_type.total_rooms.saturating_sub(peak_occupied),
            nights,
        }
    }
}
