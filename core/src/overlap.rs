//! Interval overlap engine.
//!
//! Computes how many existing stays cover the busiest single night of a query window.
//! Counting the stays that merely touch the window would over-count: two bookings can
//! each overlap the window without ever sharing a night with one another, and the
//! binding constraint for inventory is always the worst night.
//!
//! # Algorithm
//!
//! Every existing stay is clipped to the window and becomes a `+1` event at its first
//! night and a `-1` event at its departure day. Events are swept in date order while
//! tracking a running sum; the peak of that sum is the answer. When a departure and an
//! arrival share a date the departure is applied first, so back-to-back stays
//! (check-out day == next check-in day) never count as concurrent.

use crate::types::StayDates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Occupancy of a single night
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightlyOccupancy {
    /// The night
    pub night: NaiveDate,
    /// Number of stays covering it
    pub occupied: u32,
}

/// Event delta. `Departure` sorts before `Arrival`, which gives the end-before-start
/// tie-break for free.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    Departure,
    Arrival,
}

/// Clips `stay` to `window`, or `None` if they share no night
fn clip(stay: StayDates, window: StayDates) -> Option<(NaiveDate, NaiveDate)> {
    stay.overlaps(&window).then(|| {
        (
            stay.check_in().max(window.check_in()),
            stay.check_out().min(window.check_out()),
        )
    })
}

/// Maximum number of `existing` stays that cover any single night of `window`.
///
/// Pure and deterministic; the order of `existing` does not matter.
#[must_use]
pub fn peak_occupancy<I>(window: StayDates, existing: I) -> u32
where
    I: IntoIterator<Item = StayDates>,
{
    let mut edges: Vec<(NaiveDate, Edge)> = Vec::new();
    for (start, end) in existing.into_iter().filter_map(|stay| clip(stay, window)) {
        edges.push((start, Edge::Arrival));
        edges.push((end, Edge::Departure));
    }
    edges.sort_unstable();

    let mut running: u32 = 0;
    let mut peak: u32 = 0;
    for (_, edge) in edges {
        match edge {
            Edge::Arrival => {
                running = running.saturating_add(1);
                peak = peak.max(running);
            }
            Edge::Departure => running = running.saturating_sub(1),
        }
    }
    peak
}

/// Maximum number of `stays` that share any single night, over all of their nights.
#[must_use]
pub fn busiest_night(stays: &[StayDates]) -> u32 {
    let first = stays.iter().map(StayDates::check_in).min();
    let last = stays.iter().map(StayDates::check_out).max();
    match (first, last) {
        (Some(first), Some(last)) => StayDates::new(first, last)
            .map_or(0, |span| peak_occupancy(span, stays.iter().copied())),
        _ => 0,
    }
}

/// Per-night occupancy of `window` by `existing` stays, one entry per night in order.
#[must_use]
pub fn nightly_occupancy<I>(window: StayDates, existing: I) -> Vec<NightlyOccupancy>
where
    I: IntoIterator<Item = StayDates>,
{
    let nights = window.nights() as usize;
    let offset = |date: NaiveDate| {
        usize::try_from((date - window.check_in()).num_days()).unwrap_or(0)
    };

    // Difference array over night offsets; the extra slot absorbs departures on the
    // window's own check-out day.
    let mut deltas = vec![0_i64; nights + 1];
    for (start, end) in existing.into_iter().filter_map(|stay| clip(stay, window)) {
        deltas[offset(start)] += 1;
        deltas[offset(end)] -= 1;
    }

    let mut running = 0_i64;
    window
        .nights_iter()
        .zip(deltas)
        .map(|(night, delta)| {
            running += delta;
            NightlyOccupancy {
                night,
                occupied: u32::try_from(running).unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn stay(from: u32, to: u32) -> StayDates {
        StayDates::new(day(from), day(to)).unwrap()
    }

    /// Reference implementation: count stays covering each night directly.
    fn brute_force_peak(window: StayDates, existing: &[StayDates]) -> u32 {
        window
            .nights_iter()
            .map(|night| {
                u32::try_from(existing.iter().filter(|s| s.contains_night(night)).count()).unwrap()
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn empty_set_has_no_occupancy() {
        assert_eq!(peak_occupancy(stay(1, 5), []), 0);
    }

    #[test]
    fn overlapping_the_window_is_not_the_same_as_overlapping_each_other() {
        // Both touch [1, 5) but never on the same night.
        let existing = [stay(1, 3), stay(3, 5)];
        assert_eq!(peak_occupancy(stay(1, 5), existing), 1);
    }

    #[test]
    fn checkout_and_checkin_on_the_same_day_are_compatible() {
        assert_eq!(peak_occupancy(stay(10, 12), [stay(8, 10)]), 0);
        assert_eq!(peak_occupancy(stay(10, 12), [stay(12, 14)]), 0);
        assert_eq!(peak_occupancy(stay(8, 10), [stay(10, 12)]), 0);
    }

    #[test]
    fn peak_is_the_worst_single_night() {
        // Jan 1-3 and Jan 2-4 both cover the night of Jan 2.
        let existing = [stay(1, 3), stay(2, 4)];
        assert_eq!(peak_occupancy(stay(2, 3), existing), 2);
        assert_eq!(peak_occupancy(stay(1, 2), existing), 1);
        assert_eq!(peak_occupancy(stay(3, 4), existing), 1);
        assert_eq!(peak_occupancy(stay(1, 4), existing), 2);
    }

    #[test]
    fn stays_outside_the_window_are_ignored() {
        let existing = [stay(1, 3), stay(20, 25), stay(4, 6)];
        assert_eq!(peak_occupancy(stay(10, 15), existing), 0);
    }

    #[test]
    fn busiest_night_spans_every_stay() {
        assert_eq!(busiest_night(&[]), 0);
        assert_eq!(busiest_night(&[stay(1, 3), stay(3, 5)]), 1);
        assert_eq!(busiest_night(&[stay(1, 3), stay(20, 25), stay(2, 21)]), 2);
    }

    #[test]
    fn nightly_breakdown_counts_each_night() {
        let existing = [stay(1, 3), stay(2, 4), stay(2, 3)];
        let breakdown = nightly_occupancy(stay(1, 5), existing);
        let occupied: Vec<u32> = breakdown.iter().map(|n| n.occupied).collect();
        assert_eq!(occupied, vec![1, 3, 1, 0]);
        assert_eq!(breakdown[0].night, day(1));
        assert_eq!(breakdown[3].night, day(4));
    }

    fn arb_stay() -> impl Strategy<Value = StayDates> {
        (0_u64..40, 1_u64..10).prop_map(|(offset, len)| {
            let check_in = day(1) + chrono::Days::new(offset);
            StayDates::new(check_in, check_in + chrono::Days::new(len)).unwrap()
        })
    }

    proptest! {
        #[test]
        fn sweep_matches_brute_force(
            window in arb_stay(),
            existing in prop::collection::vec(arb_stay(), 0..24),
        ) {
            prop_assert_eq!(
                peak_occupancy(window, existing.iter().copied()),
                brute_force_peak(window, &existing)
            );
        }

        #[test]
        fn peak_is_max_of_nightly_breakdown(
            window in arb_stay(),
            existing in prop::collection::vec(arb_stay(), 0..24),
        ) {
            let breakdown = nightly_occupancy(window, existing.iter().copied());
            prop_assert_eq!(breakdown.len(), window.nights() as usize);
            let max = breakdown.iter().map(|n| n.occupied).max().unwrap_or(0);
            prop_assert_eq!(peak_occupancy(window, existing), max);
        }

        #[test]
        fn overlap_is_symmetric(a in arb_stay(), b in arb_stay()) {
            let forward = peak_occupancy(a, [b]);
            let backward = peak_occupancy(b, [a]);
            prop_assert_eq!(forward, backward);
            prop_assert_eq!(forward == 1, a.overlaps(&b));
        }

        #[test]
        fn order_of_existing_stays_does_not_matter(
            window in arb_stay(),
            mut existing in prop::collection::vec(arb_stay(), 0..16),
        ) {
            let before = peak_occupancy(window, existing.iter().copied());
            existing.reverse();
            prop_assert_eq!(peak_occupancy(window, existing), before);
        }
    }
}
