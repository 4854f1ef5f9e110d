//! Reservation ledger.
//!
//! An arena of reservation records keyed by id, with reverse indexes by room type
//! (active reservations only), by user and by payment. The active index is what the
//! availability check reads, so it never scans cancelled or checked-out reservations.
//! Stays whose check-out day has passed stop counting as soon as the day arrives and
//! are dropped from the index by [`ReservationLedger::release_ended`].
//!
//! Every mutation goes through [`ReservationLedger::update`], which applies a closure
//! to a copy of the record and publishes it only if the closure succeeds. Readers
//! therefore never observe a half-applied change, and a failed update leaves the
//! record exactly as it was.

use chrono::{DateTime, NaiveDate, Utc};
use hotel_booking_core::error::BookingError;
use hotel_booking_core::types::{
    Money, Payment, PaymentId, PaymentStatus, Reservation, ReservationId, ReservationStatus,
    RoomTypeId, StayDates, UserId,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
struct LedgerState {
    reservations: HashMap<ReservationId, Reservation>,
    active_by_room_type: HashMap<RoomTypeId, HashSet<ReservationId>>,
    by_user: HashMap<UserId, Vec<ReservationId>>,
    by_payment: HashMap<PaymentId, ReservationId>,
}

impl LedgerState {
    fn reindex(&mut self, reservation: &Reservation) {
        if reservation.holds_inventory() {
            self.active_by_room_type
                .entry(reservation.room_type_id)
                .or_default()
                .insert(reservation.id);
        } else if let Some(active) = self.active_by_room_type.get_mut(&reservation.room_type_id) {
            active.remove(&reservation.id);
        }
    }

    fn collect<'a, I>(&self, ids: I) -> Vec<Reservation>
    where
        I: IntoIterator<Item = &'a ReservationId>,
    {
        ids.into_iter()
            .filter_map(|id| self.reservations.get(id).cloned())
            .collect()
    }
}

/// Counts and totals across all reservations
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationStatistics {
    /// Reservations per status
    pub by_status: BTreeMap<ReservationStatus, usize>,
    /// All reservations ever made
    pub total: usize,
    /// Captured payments net of refunds
    pub captured_revenue: Money,
    /// Amount returned to guests
    pub refunded: Money,
}

impl ReservationStatistics {
    /// Reservations in `status`
    #[must_use]
    pub fn count(&self, status: ReservationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// In-memory reservation store with the indexes the booking core needs
#[derive(Debug, Default)]
pub struct ReservationLedger {
    state: RwLock<LedgerState>,
}

impl ReservationLedger {
    /// Creates an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new reservation
    pub fn insert(&self, reservation: Reservation) {
        let mut state = self.state.write();
        state.reindex(&reservation);
        state
            .by_user
            .entry(reservation.user_id)
            .or_default()
            .push(reservation.id);
        state
            .by_payment
            .insert(reservation.payment.id, reservation.id);
        state.reservations.insert(reservation.id, reservation);
    }

    /// Current copy of a reservation
    #[must_use]
    pub fn get(&self, id: ReservationId) -> Option<Reservation> {
        self.state.read().reservations.get(&id).cloned()
    }

    /// Applies `change` to the reservation and publishes the result atomically.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] for an unknown id, or whatever
    /// `change` returns; in both cases the stored record is unchanged.
    pub fn update<F>(&self, id: ReservationId, change: F) -> Result<Reservation, BookingError>
    where
        F: FnOnce(&mut Reservation) -> Result<(), BookingError>,
    {
        let mut state = self.state.write();
        let mut draft = state
            .reservations
            .get(&id)
            .cloned()
            .ok_or(BookingError::ReservationNotFound(id))?;
        change(&mut draft)?;

        state.reindex(&draft);
        state.reservations.insert(id, draft.clone());
        Ok(draft)
    }

    /// Stays of the reservations holding inventory of `room_type_id` on `today` or later
    #[must_use]
    pub fn active_stays(&self, room_type_id: RoomTypeId, today: NaiveDate) -> Vec<StayDates> {
        let state = self.state.read();
        state
            .active_by_room_type
            .get(&room_type_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.reservations.get(id))
                    .filter(|reservation| reservation.holds_inventory_on(today))
                    .map(|reservation| reservation.stay)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of reservations holding inventory of `room_type_id` on `today` or later
    #[must_use]
    pub fn active_count(&self, room_type_id: RoomTypeId, today: NaiveDate) -> usize {
        let state = self.state.read();
        state
            .active_by_room_type
            .get(&room_type_id)
            .map_or(0, |ids| {
                ids.iter()
                    .filter_map(|id| state.reservations.get(id))
                    .filter(|reservation| reservation.holds_inventory_on(today))
                    .count()
            })
    }

    /// Drops stays that ended before `today` from the active index of `room_type_id`.
    ///
    /// Unpaid reservations stay indexed so the expiry sweep still finds them. Returns
    /// the number of reservations dropped.
    pub fn release_ended(&self, room_type_id: RoomTypeId, today: NaiveDate) -> usize {
        let mut state = self.state.write();
        let LedgerState {
            reservations,
            active_by_room_type,
            ..
        } = &mut *state;
        let Some(active) = active_by_room_type.get_mut(&room_type_id) else {
            return 0;
        };
        let before = active.len();
        active.retain(|id| {
            reservations.get(id).is_some_and(|reservation| {
                reservation.status == ReservationStatus::PendingPayment
                    || reservation.holds_inventory_on(today)
            })
        });
        before - active.len()
    }

    /// Reservations owned by `user_id`, oldest first
    #[must_use]
    pub fn for_user(&self, user_id: UserId) -> Vec<Reservation> {
        let state = self.state.read();
        state
            .by_user
            .get(&user_id)
            .map(|ids| state.collect(ids))
            .unwrap_or_default()
    }

    /// Reservations whose stay shares a night with `window`, by check-in
    #[must_use]
    pub fn overlapping(&self, window: StayDates) -> Vec<Reservation> {
        let state = self.state.read();
        let mut found: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|reservation| reservation.stay.overlaps(&window))
            .cloned()
            .collect();
        found.sort_by_key(|reservation| (reservation.check_in(), reservation.created_at));
        found
    }

    /// Every reservation, newest first
    #[must_use]
    pub fn all(&self) -> Vec<Reservation> {
        let state = self.state.read();
        let mut all: Vec<Reservation> = state.reservations.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Payment and owner for a payment id
    #[must_use]
    pub fn payment(&self, payment_id: PaymentId) -> Option<(UserId, Payment)> {
        let state = self.state.read();
        let reservation_id = state.by_payment.get(&payment_id)?;
        state
            .reservations
            .get(reservation_id)
            .map(|reservation| (reservation.user_id, reservation.payment.clone()))
    }

    /// Reservations still waiting for payment that were created at or before `cutoff`
    #[must_use]
    pub fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Vec<ReservationId> {
        let state = self.state.read();
        state
            .active_by_room_type
            .values()
            .flatten()
            .filter_map(|id| state.reservations.get(id))
            .filter(|r| r.status == ReservationStatus::PendingPayment && r.created_at <= cutoff)
            .map(|r| r.id)
            .collect()
    }

    /// Aggregate counts and payment totals
    #[must_use]
    pub fn statistics(&self) -> ReservationStatistics {
        let state = self.state.read();
        let mut stats = ReservationStatistics {
            total: state.reservations.len(),
            ..ReservationStatistics::default()
        };
        for reservation in state.reservations.values() {
            *stats.by_status.entry(reservation.status).or_default() += 1;
            let payment = &reservation.payment;
            stats.captured_revenue = stats.captured_revenue.saturating_add(payment.net_captured());
            if payment.status == PaymentStatus::Refunded {
                stats.refunded = stats.refunded.saturating_add(payment.refunded_amount);
            }
        }
        stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn reservation(user_id: UserId, room_type_id: RoomTypeId, from: u32, to: u32) -> Reservation {
        Reservation::pending(
            user_id,
            room_type_id,
            StayDates::new(day(from), day(to)).unwrap(),
            2,
            Money::from_dollars(200),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn active_index_follows_status() {
        let ledger = ReservationLedger::new();
        let room = RoomTypeId::new();
        let first = reservation(UserId::new(), room, 1, 3);
        let second = reservation(UserId::new(), room, 2, 4);
        ledger.insert(first.clone());
        ledger.insert(second.clone());
        assert_eq!(ledger.active_count(room, day(1)), 2);

        ledger
            .update(first.id, |r| {
                r.status = ReservationStatus::Cancelled;
                Ok(())
            })
            .unwrap();
        assert_eq!(ledger.active_stays(room, day(1)), vec![second.stay]);
    }

    #[test]
    fn ended_stays_stop_counting_and_are_released() {
        let ledger = ReservationLedger::new();
        let room = RoomTypeId::new();
        let no_show = reservation(UserId::new(), room, 1, 3);
        let unpaid = reservation(UserId::new(), room, 1, 2);
        let upcoming = reservation(UserId::new(), room, 5, 7);
        ledger.insert(no_show.clone());
        ledger.insert(unpaid.clone());
        ledger.insert(upcoming.clone());
        ledger
            .update(no_show.id, |r| {
                r.status = ReservationStatus::Confirmed;
                Ok(())
            })
            .unwrap();

        assert_eq!(ledger.active_count(room, day(2)), 2);
        assert_eq!(ledger.active_count(room, day(4)), 1);
        assert_eq!(ledger.active_stays(room, day(4)), vec![upcoming.stay]);

        assert_eq!(ledger.release_ended(room, day(4)), 1);
        assert_eq!(ledger.pending_created_before(Utc::now()).len(), 2);
        assert_eq!(ledger.active_count(room, day(4)), 1);
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let ledger = ReservationLedger::new();
        let original = reservation(UserId::new(), RoomTypeId::new(), 1, 3);
        ledger.insert(original.clone());

        let result = ledger.update(original.id, |r| {
            r.status = ReservationStatus::Cancelled;
            Err(BookingError::ConcurrentUpdate(r.id))
        });
        assert_eq!(result, Err(BookingError::ConcurrentUpdate(original.id)));
        assert_eq!(ledger.get(original.id), Some(original.clone()));
        assert_eq!(ledger.active_count(original.room_type_id, day(1)), 1);
    }

    #[test]
    fn lookups_by_user_payment_and_window() {
        let ledger = ReservationLedger::new();
        let guest = UserId::new();
        let room = RoomTypeId::new();
        let early = reservation(guest, room, 1, 3);
        let late = reservation(UserId::new(), room, 10, 12);
        ledger.insert(early.clone());
        ledger.insert(late.clone());

        assert_eq!(ledger.for_user(guest), vec![early.clone()]);
        assert_eq!(ledger.payment(early.payment.id), Some((guest, early.payment.clone())));
        assert!(ledger.payment(PaymentId::new()).is_none());

        let window = StayDates::new(day(2), day(11)).unwrap();
        let ids: Vec<ReservationId> = ledger.overlapping(window).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
        let window = StayDates::new(day(3), day(10)).unwrap();
        assert!(ledger.overlapping(window).is_empty());
    }

    #[test]
    fn stale_pending_scan_ignores_fresh_reservations() {
        let ledger = ReservationLedger::new();
        let room = RoomTypeId::new();
        let mut old = reservation(UserId::new(), room, 1, 3);
        old.created_at = Utc::now() - Duration::hours(1);
        let fresh = reservation(UserId::new(), room, 5, 6);
        ledger.insert(old.clone());
        ledger.insert(fresh);

        let cutoff = Utc::now() - Duration::minutes(15);
        assert_eq!(ledger.pending_created_before(cutoff), vec![old.id]);
    }

    #[test]
    fn statistics_count_statuses_and_money() {
        let ledger = ReservationLedger::new();
        let room = RoomTypeId::new();
        let paid = reservation(UserId::new(), room, 1, 3);
        let refunded = reservation(UserId::new(), room, 1, 3);
        ledger.insert(paid.clone());
        ledger.insert(refunded.clone());
        ledger.insert(reservation(UserId::new(), room, 1, 3));

        ledger
            .update(paid.id, |r| {
                r.status = ReservationStatus::Confirmed;
                r.payment.status = PaymentStatus::Succeeded;
                Ok(())
            })
            .unwrap();
        ledger
            .update(refunded.id, |r| {
                r.status = ReservationStatus::Cancelled;
                r.payment.status = PaymentStatus::Refunded;
                r.payment.refunded_amount = Money::from_dollars(50);
                Ok(())
            })
            .unwrap();

        let stats = ledger.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(ReservationStatus::PendingPayment), 1);
        assert_eq!(stats.count(ReservationStatus::Confirmed), 1);
        assert_eq!(stats.count(ReservationStatus::Cancelled), 1);
        assert_eq!(stats.captured_revenue, Money::from_dollars(350));
        assert_eq!(stats.refunded, Money::from_dollars(50));
    }
}
