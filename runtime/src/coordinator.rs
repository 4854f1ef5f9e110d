//! Booking coordinator.
//!
//! The single entry point for everything that reads or changes inventory. Operations
//! that change a room type's active reservation set (reserve, cancel, payment failure
//! and expiry, check-in/check-out, room type updates) run while holding that room
//! type's coordination slot, so the availability check and the write that depends on
//! it are indivisible. Availability queries for display read without the slot and are
//! advisory only.
//!
//! The slot is never held while waiting for a payment to settle: `reserve` records the
//! reservation as `PENDING_PAYMENT`, releases the slot, then asks the bridge for a
//! payment intent. Settlement arrives later through
//! [`BookingCoordinator::handle_settlement`].

use crate::catalog::RoomCatalog;
use crate::config::BookingConfig;
use crate::ledger::{ReservationLedger, ReservationStatistics};
use crate::metrics::{BookingMetrics, Rejection};
use crate::refund_flow::CancellationRefundFlow;
use crate::retry::{RetryPolicy, retry_with_predicate};
use crate::slots::RoomSlots;
use chrono::{NaiveDate, TimeDelta};
use futures::future::join_all;
use hotel_booking_core::availability::{Availability, AvailabilityCalculator};
use hotel_booking_core::bridge::{
    PaymentSettlementBridge, SettlementEvent, SettlementOutcome,
};
use hotel_booking_core::environment::{Clock, SystemClock};
use hotel_booking_core::error::{BookingError, BookingResult};
use hotel_booking_core::lifecycle::{
    LifecycleEvent, ReservationStateMachine, payment_status_after,
};
use hotel_booking_core::overlap::busiest_night;
use hotel_booking_core::refund::{RefundPolicy, RefundQuote};
use hotel_booking_core::types::{
    Caller, Money, Payment, PaymentId, PaymentStatus, Reservation, ReservationId,
    ReservationStatus, RoomFilter, RoomType, RoomTypeId, StayDates, UserId,
};
use std::sync::{Arc, Weak};

/// A request to book one unit of a room type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservationRequest {
    /// Guest making the booking
    pub user_id: UserId,
    /// Room type to book
    pub room_type_id: RoomTypeId,
    /// First night
    pub check_in: NaiveDate,
    /// Departure day
    pub check_out: NaiveDate,
    /// Number of occupants
    pub guests: u32,
    /// Special requests
    pub notes: Option<String>,
}

impl ReservationRequest {
    /// Creates a request without notes
    #[must_use]
    pub const fn new(
        user_id: UserId,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> Self {
        Self {
            user_id,
            room_type_id,
            check_in,
            check_out,
            guests,
            notes: None,
        }
    }

    /// Attaches special requests
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

struct Inner {
    config: BookingConfig,
    catalog: RoomCatalog,
    ledger: ReservationLedger,
    slots: RoomSlots,
    calculator: AvailabilityCalculator,
    machine: ReservationStateMachine,
    refunds: CancellationRefundFlow,
    bridge: Arc<dyn PaymentSettlementBridge>,
    clock: Arc<dyn Clock>,
}

/// Race-free booking, cancellation and lifecycle operations over a room catalog.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct BookingCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for BookingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingCoordinator")
            .field("room_types", &self.inner.catalog.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BookingCoordinator`]
pub struct BookingCoordinatorBuilder {
    bridge: Arc<dyn PaymentSettlementBridge>,
    config: BookingConfig,
    clock: Arc<dyn Clock>,
    refund_policy: Option<Arc<dyn RefundPolicy>>,
    rooms: Vec<RoomType>,
}

impl BookingCoordinatorBuilder {
    /// Use `config` instead of the defaults
    #[must_use]
    pub fn config(mut self, config: BookingConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` instead of the system clock
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `policy` instead of the tiered policy described by the configuration
    #[must_use]
    pub fn refund_policy(mut self, policy: Arc<dyn RefundPolicy>) -> Self {
        self.refund_policy = Some(policy);
        self
    }

    /// Adds a room type to the initial catalog
    #[must_use]
    pub fn room_type(mut self, room: RoomType) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds room types to the initial catalog
    #[must_use]
    pub fn room_types<I>(mut self, rooms: I) -> Self
    where
        I: IntoIterator<Item = RoomType>,
    {
        self.rooms.extend(rooms);
        self
    }

    /// Build the [`BookingCoordinator`]
    #[must_use]
    pub fn build(self) -> BookingCoordinator {
        let policy: Arc<dyn RefundPolicy> = match self.refund_policy {
            Some(policy) => policy,
            None => Arc::new(self.config.refund.policy()),
        };
        let refunds = CancellationRefundFlow::new(
            policy,
            Arc::clone(&self.bridge),
            self.config.bridge_timeout(),
        );

        BookingCoordinator {
            inner: Arc::new(Inner {
                slots: RoomSlots::new(self.config.lock_timeout()),
                catalog: RoomCatalog::with_rooms(self.rooms),
                ledger: ReservationLedger::new(),
                calculator: AvailabilityCalculator::new(),
                machine: ReservationStateMachine::new(),
                refunds,
                bridge: self.bridge,
                clock: self.clock,
                config: self.config,
            }),
        }
    }
}

impl BookingCoordinator {
    /// Starts building a coordinator that settles payments through `bridge`
    #[must_use]
    pub fn builder(bridge: Arc<dyn PaymentSettlementBridge>) -> BookingCoordinatorBuilder {
        BookingCoordinatorBuilder {
            bridge,
            config: BookingConfig::default(),
            clock: Arc::new(SystemClock),
            refund_policy: None,
            rooms: Vec::new(),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &BookingConfig {
        &self.inner.config
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Looks up a room type.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RoomNotFound`] if the id is unknown.
    pub fn room_type(&self, id: RoomTypeId) -> BookingResult<RoomType> {
        self.inner.catalog.get(id)
    }

    /// All room types, cheapest first
    #[must_use]
    pub fn room_types(&self) -> Vec<RoomType> {
        self.inner.catalog.list()
    }

    /// Room types matching `filter`, cheapest first
    #[must_use]
    pub fn search_room_types(&self, filter: &RoomFilter) -> Vec<RoomType> {
        self.inner.catalog.search(filter)
    }

    /// Adds a room type to the catalog (staff only).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`] for guests, [`BookingError::Busy`], or
    /// [`BookingError::RoomTypeExists`] if the id is already in the catalog; use
    /// [`update_room_type`](Self::update_room_type) to change an existing room type.
    pub async fn add_room_type(&self, caller: &Caller, room: RoomType) -> BookingResult<RoomType> {
        require_privilege(caller, "manage room types")?;

        let _slot = self.inner.slots.acquire(room.id).await?;
        if self.inner.catalog.contains(room.id) {
            return Err(BookingError::RoomTypeExists(room.id));
        }
        self.inner.catalog.upsert(room.clone());
        tracing::info!(room_type_id = %room.id, name = %room.name, "Room type added");
        Ok(room)
    }

    /// Replaces a room type's definition (staff only).
    ///
    /// Runs under the room type's slot so no booking sees a half-changed inventory.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`], [`BookingError::RoomNotFound`] or
    /// [`BookingError::Busy`], and [`BookingError::InventoryBelowBookings`] if
    /// `total_rooms` is below the units already held on some upcoming night.
    pub async fn update_room_type(
        &self,
        caller: &Caller,
        room: RoomType,
    ) -> BookingResult<RoomType> {
        require_privilege(caller, "manage room types")?;
        self.inner.catalog.get(room.id)?;

        let _slot = self.inner.slots.acquire(room.id).await?;
        self.inner.catalog.get(room.id)?;
        let booked = busiest_night(&self.active_stays(room.id));
        if room.total_rooms < booked {
            return Err(BookingError::InventoryBelowBookings {
                room_type_id: room.id,
                total_rooms: room.total_rooms,
                booked,
            });
        }
        self.inner.catalog.upsert(room.clone());
        tracing::info!(
            room_type_id = %room.id,
            total_rooms = room.total_rooms,
            "Room type updated"
        );
        Ok(room)
    }

    /// Removes a room type that no reservation is holding (staff only).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`], [`BookingError::RoomNotFound`],
    /// [`BookingError::Busy`] or [`BookingError::RoomTypeInUse`].
    pub async fn remove_room_type(
        &self,
        caller: &Caller,
        id: RoomTypeId,
    ) -> BookingResult<RoomType> {
        require_privilege(caller, "manage room types")?;
        self.inner.catalog.get(id)?;

        let _slot = self.inner.slots.acquire(id).await?;
        let active = self.inner.ledger.active_count(id, self.inner.clock.today());
        if active > 0 {
            return Err(BookingError::RoomTypeInUse {
                room_type_id: id,
                active,
            });
        }
        let room = self.inner.catalog.remove(id)?;

        tracing::info!(room_type_id = %id, "Room type removed");
        Ok(room)
    }

    /// Stays holding inventory of the room type from today on
    fn active_stays(&self, room_type_id: RoomTypeId) -> Vec<StayDates> {
        self.inner
            .ledger
            .active_stays(room_type_id, self.inner.clock.today())
    }

    // ========================================================================
    // Availability (advisory, no slot)
    // ========================================================================

    /// Free units of a room type for every night of `[check_in, check_out)`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RoomNotFound`] or [`BookingError::InvalidDateRange`].
    pub fn available_units(
        &self,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> BookingResult<u32> {
        let room = self.inner.catalog.get(room_type_id)?;
        self.inner.calculator.available_units_between(
            &room,
            check_in,
            check_out,
            self.inner.clock.today(),
            self.active_stays(room_type_id),
        )
    }

    /// Availability of a room type for `guests`, with a per-night breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RoomNotFound`], [`BookingError::InvalidDateRange`],
    /// [`BookingError::NoGuests`] or [`BookingError::GuestCountExceeded`].
    pub fn availability(
        &self,
        room_type_id: RoomTypeId,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> BookingResult<Availability> {
        let room = self.inner.catalog.get(room_type_id)?;
        let stay = StayDates::bookable(check_in, check_out, self.inner.clock.today())?;
        check_guests(&room, guests)?;

        let active = self.active_stays(room_type_id);
        let availability = self.inner.calculator.availability(&room, stay, &active, true);
        tracing::debug!(
            room_type_id = %room_type_id,
            stay = %stay,
            available = availability.available,
            "Computed availability"
        );
        Ok(availability)
    }

    /// Every room type that fits `guests` and has a free unit for the whole stay.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] or [`BookingError::NoGuests`].
    pub fn available_room_types(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
    ) -> BookingResult<Vec<Availability>> {
        let stay = StayDates::bookable(check_in, check_out, self.inner.clock.today())?;
        if guests == 0 {
            return Err(BookingError::NoGuests);
        }

        let filter = RoomFilter {
            min_occupancy: Some(guests),
            ..RoomFilter::default()
        };
        Ok(self
            .inner
            .catalog
            .search(&filter)
            .iter()
            .map(|room| {
                let active = self.active_stays(room.id);
                self.inner.calculator.availability(room, stay, &active, true)
            })
            .filter(Availability::is_available)
            .collect())
    }

    // ========================================================================
    // Booking
    // ========================================================================

    /// Books one unit of a room type, leaving it `PENDING_PAYMENT` with a payment
    /// intent attached.
    ///
    /// # Errors
    ///
    /// - Validation: [`BookingError::RoomNotFound`], [`BookingError::InvalidDateRange`],
    ///   [`BookingError::NoGuests`], [`BookingError::GuestCountExceeded`]
    /// - [`BookingError::Busy`] if the room type's slot is contended
    /// - [`BookingError::CapacityExceeded`] if any night is sold out
    /// - [`BookingError::PaymentIntentFailed`] if the provider refused the intent; the
    ///   reservation has then been cancelled and its unit released, or, if the room
    ///   type stayed busy through every release attempt, it is left to the payment
    ///   timeout
    #[tracing::instrument(
        skip(self, request),
        fields(room_type_id = %request.room_type_id, user_id = %request.user_id)
    )]
    pub async fn reserve(&self, request: ReservationRequest) -> BookingResult<Reservation> {
        let stay = self.validate(&request).inspect_err(|error| {
            BookingMetrics::record_rejection(Rejection::Validation);
            tracing::debug!(error = %error, "Reservation request rejected");
        })?;

        let reservation = {
            let slot = self
                .inner
                .slots
                .acquire(request.room_type_id)
                .await
                .inspect_err(|_| BookingMetrics::record_rejection(Rejection::Busy))?;

            // Authoritative check: the catalog and the active set cannot change while
            // the slot is held.
            let room = self.inner.catalog.get(slot.room_type_id())?;
            let total = price_stay(&room, stay, request.guests)?;
            let today = self.inner.clock.today();
            let released = self.inner.ledger.release_ended(room.id, today);
            if released > 0 {
                tracing::debug!(released, "Released ended stays from the active index");
            }
            let active = self.inner.ledger.active_stays(room.id, today);
            let available = self.inner.calculator.available_units(&room, stay, active);
            if available == 0 {
                BookingMetrics::record_rejection(Rejection::Capacity);
                tracing::warn!(
                    stay = %stay,
                    total_rooms = room.total_rooms,
                    "Room type sold out"
                );
                return Err(BookingError::CapacityExceeded {
                    room_type_id: room.id,
                    check_in: stay.check_in(),
                    check_out: stay.check_out(),
                });
            }

            let reservation = Reservation::pending(
                request.user_id,
                room.id,
                stay,
                request.guests,
                total,
                request.notes,
                self.inner.clock.now(),
            );
            self.inner.ledger.insert(reservation.clone());
            reservation
        };

        BookingMetrics::record_reservation("created");
        tracing::info!(
            reservation_id = %reservation.id,
            stay = %stay,
            total = reservation.total_amount.cents(),
            "Reservation created, awaiting payment"
        );

        self.schedule_payment_timer(reservation.id);
        self.attach_payment_intent(reservation).await
    }

    /// [`reserve`](Self::reserve), retrying while the room type is busy.
    ///
    /// # Errors
    ///
    /// Returns the last error once `policy` is exhausted, or the first error that is
    /// not [retryable](BookingError::is_retryable).
    pub async fn reserve_with_retry(
        &self,
        request: ReservationRequest,
        policy: RetryPolicy,
    ) -> BookingResult<Reservation> {
        retry_with_predicate(
            policy,
            || self.reserve(request.clone()),
            BookingError::is_retryable,
        )
        .await
    }

    async fn attach_payment_intent(&self, reservation: Reservation) -> BookingResult<Reservation> {
        let id = reservation.id;
        let call = self
            .inner
            .bridge
            .create_intent(id, reservation.total_amount);

        let reason = match tokio::time::timeout(self.inner.config.bridge_timeout(), call).await {
            Ok(Ok(intent)) => {
                let now = self.inner.clock.now();
                return self.inner.ledger.update(id, |r| {
                    r.payment.intent_id = Some(intent.intent_id);
                    r.payment.updated_at = now;
                    Ok(())
                });
            }
            Ok(Err(error)) => error.to_string(),
            Err(_) => "payment provider timed out".to_string(),
        };

        tracing::warn!(reservation_id = %id, reason = %reason, "Payment intent creation failed");
        let message = format!("Payment failed: {reason}");
        let released = retry_with_predicate(
            RetryPolicy::default(),
            || self.fail_payment(id, LifecycleEvent::PaymentFailed, &message),
            BookingError::is_retryable,
        )
        .await;
        if let Err(error) = released {
            tracing::warn!(
                reservation_id = %id,
                error = %error,
                "Could not release reservation after intent failure, leaving it to expire"
            );
        }
        Err(BookingError::PaymentIntentFailed {
            reservation_id: id,
            reason,
        })
    }

    fn validate(&self, request: &ReservationRequest) -> BookingResult<StayDates> {
        let room = self.inner.catalog.get(request.room_type_id)?;
        let stay =
            StayDates::bookable(request.check_in, request.check_out, self.inner.clock.today())?;
        price_stay(&room, stay, request.guests)?;
        Ok(stay)
    }

    // ========================================================================
    // Settlement and expiry
    // ========================================================================

    /// Applies a settlement notification from the payment provider.
    ///
    /// Success confirms the reservation without taking the slot (inventory is already
    /// held). Failure cancels it and releases the unit under the slot.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`] for an unknown reservation
    /// - [`BookingError::SettlementMismatch`] if the settled amount differs from the
    ///   reservation total; nothing is changed
    /// - [`BookingError::InvalidStatusTransition`] if the reservation is no longer
    ///   waiting for payment
    /// - [`BookingError::Busy`] if a failure cannot take the slot
    #[tracing::instrument(skip(self, event), fields(reservation_id = %event.reservation_id))]
    pub async fn handle_settlement(&self, event: SettlementEvent) -> BookingResult<Reservation> {
        let id = event.reservation_id;
        match event.outcome {
            SettlementOutcome::Succeeded { settled_amount } => {
                self.confirm_payment(id, settled_amount)
            }
            SettlementOutcome::Failed { reason } => {
                let message = format!("Payment failed: {reason}");
                self.fail_payment(id, LifecycleEvent::PaymentFailed, &message)
                    .await
            }
        }
    }

    fn confirm_payment(
        &self,
        id: ReservationId,
        settled: Option<Money>,
    ) -> BookingResult<Reservation> {
        let machine = self.inner.machine;
        let now = self.inner.clock.now();

        let result = self.inner.ledger.update(id, |r| {
            machine.transition(r.status, LifecycleEvent::PaymentSucceeded)?;
            if let Some(settled) = settled.filter(|settled| *settled != r.total_amount) {
                return Err(BookingError::SettlementMismatch {
                    expected: r.total_amount,
                    settled,
                });
            }
            machine.apply(r, LifecycleEvent::PaymentSucceeded, now)?;
            r.payment.status = PaymentStatus::Succeeded;
            r.payment.updated_at = now;
            Ok(())
        });

        match result {
            Ok(reservation) => {
                BookingMetrics::record_reservation("confirmed");
                BookingMetrics::record_payment(PaymentStatus::Succeeded);
                tracing::info!(reservation_id = %id, "Payment settled, reservation confirmed");
                Ok(reservation)
            }
            Err(error) => {
                tracing::warn!(reservation_id = %id, error = %error, "Settlement rejected");
                Err(error)
            }
        }
    }

    /// Cancels a `PENDING_PAYMENT` reservation through a payment failure or timeout
    async fn fail_payment(
        &self,
        id: ReservationId,
        event: LifecycleEvent,
        reason: &str,
    ) -> BookingResult<Reservation> {
        let room_type_id = self
            .inner
            .ledger
            .get(id)
            .ok_or(BookingError::ReservationNotFound(id))?
            .room_type_id;
        let _slot = self.inner.slots.acquire(room_type_id).await?;

        let machine = self.inner.machine;
        let now = self.inner.clock.now();
        let reservation = self.inner.ledger.update(id, |r| {
            machine.apply(r, event, now)?;
            if let Some(status) = payment_status_after(event) {
                r.payment.status = status;
                r.payment.updated_at = now;
            }
            r.cancellation_reason = Some(reason.to_string());
            Ok(())
        })?;

        let status = if event == LifecycleEvent::PaymentTimedOut {
            "expired"
        } else {
            "cancelled"
        };
        BookingMetrics::record_reservation(status);
        BookingMetrics::record_payment(PaymentStatus::Failed);
        tracing::info!(reservation_id = %id, event = %event, "Reservation released");
        Ok(reservation)
    }

    /// Expires the reservation if it is still unpaid and its payment window has passed.
    ///
    /// Returns the cancelled reservation, or `None` if there was nothing to do.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] or [`BookingError::Busy`].
    pub async fn expire_if_unsettled(
        &self,
        id: ReservationId,
    ) -> BookingResult<Option<Reservation>> {
        let reservation = self
            .inner
            .ledger
            .get(id)
            .ok_or(BookingError::ReservationNotFound(id))?;
        if reservation.status != ReservationStatus::PendingPayment {
            return Ok(None);
        }
        let due = reservation
            .created_at
            .checked_add_signed(self.payment_window())
            .is_some_and(|deadline| self.inner.clock.now() >= deadline);
        if !due {
            return Ok(None);
        }

        match self
            .fail_payment(id, LifecycleEvent::PaymentTimedOut, "Payment not received in time")
            .await
        {
            Ok(reservation) => Ok(Some(reservation)),
            // Settled or cancelled while waiting for the slot.
            Err(BookingError::InvalidStatusTransition { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Expires every unpaid reservation whose payment window has passed.
    ///
    /// Returns the ids that were expired. Reservations that could not be processed
    /// (for example because their room type was busy) are logged and left for the
    /// next sweep.
    pub async fn expire_stale_payments(&self) -> Vec<ReservationId> {
        let Some(cutoff) = self
            .inner
            .clock
            .now()
            .checked_sub_signed(self.payment_window())
        else {
            return Vec::new();
        };

        let candidates = self.inner.ledger.pending_created_before(cutoff);
        let outcomes = join_all(
            candidates
                .into_iter()
                .map(|id| async move { (id, self.expire_if_unsettled(id).await) }),
        )
        .await;

        outcomes
            .into_iter()
            .filter_map(|(id, outcome)| match outcome {
                Ok(Some(_)) => Some(id),
                Ok(None) => None,
                Err(error) => {
                    tracing::warn!(
                        reservation_id = %id,
                        error = %error,
                        "Could not expire reservation"
                    );
                    None
                }
            })
            .collect()
    }

    fn payment_window(&self) -> TimeDelta {
        TimeDelta::from_std(self.inner.config.payment_timeout()).unwrap_or(TimeDelta::MAX)
    }

    fn schedule_payment_timer(&self, id: ReservationId) {
        if !self.inner.config.payment.schedule_timers {
            return;
        }
        let delay = self.inner.config.payment_timeout();
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let coordinator = BookingCoordinator { inner };
            match coordinator.expire_if_unsettled(id).await {
                Ok(Some(_)) => tracing::info!(reservation_id = %id, "Payment window elapsed"),
                Ok(None) => {}
                Err(error) => tracing::warn!(
                    reservation_id = %id,
                    error = %error,
                    "Payment timer could not expire reservation"
                ),
            }
        });
    }

    // ========================================================================
    // Cancellation and staff transitions
    // ========================================================================

    /// Cancels a reservation on behalf of its owner or staff, refunding as the policy
    /// dictates.
    ///
    /// `reason` defaults to the configured cancellation reason.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ReservationNotFound`], [`BookingError::Unauthorized`]
    /// - [`BookingError::Busy`] if the room type's slot is contended
    /// - [`BookingError::InvalidStatusTransition`] if already cancelled or checked out
    /// - [`BookingError::RefundFailed`] if the refund was not executed; the
    ///   reservation is unchanged
    #[tracing::instrument(
        skip(self, caller, reason),
        fields(reservation_id = %id, user_id = %caller.user_id)
    )]
    pub async fn cancel(
        &self,
        id: ReservationId,
        caller: &Caller,
        reason: Option<String>,
    ) -> BookingResult<Reservation> {
        let reservation = self
            .inner
            .ledger
            .get(id)
            .ok_or(BookingError::ReservationNotFound(id))?;
        if !caller.can_access(&reservation) {
            return Err(BookingError::Unauthorized {
                user_id: caller.user_id,
                action: "cancel this reservation",
            });
        }
        let reason = reason
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or_else(|| self.inner.config.default_cancellation_reason.clone());

        let _slot = self.inner.slots.acquire(reservation.room_type_id).await?;
        let cancellation = self
            .inner
            .refunds
            .run(&self.inner.ledger, id, &reason, self.inner.clock.now())
            .await
            .inspect_err(|error| tracing::warn!(error = %error, "Cancellation failed"))?;

        BookingMetrics::record_reservation("cancelled");
        BookingMetrics::record_payment(cancellation.reservation.payment.status);
        tracing::info!(
            refunded = cancellation.refunded().cents(),
            reason = %reason,
            "Reservation cancelled"
        );
        Ok(cancellation.reservation)
    }

    /// Applies a lifecycle event submitted by a caller.
    ///
    /// Check-in and check-out are staff only. A cancel request behaves like
    /// [`cancel`](Self::cancel) with the default reason. Payment events only arrive
    /// through [`handle_settlement`](Self::handle_settlement).
    ///
    /// # Errors
    ///
    /// - [`BookingError::Unauthorized`] for guests submitting staff events, or anyone
    ///   submitting payment events
    /// - [`BookingError::ReservationNotFound`], [`BookingError::Busy`]
    /// - [`BookingError::InvalidStatusTransition`] if the event is not allowed
    #[tracing::instrument(
        skip(self, caller),
        fields(reservation_id = %id, user_id = %caller.user_id)
    )]
    pub async fn transition(
        &self,
        id: ReservationId,
        caller: &Caller,
        event: LifecycleEvent,
    ) -> BookingResult<Reservation> {
        match event {
            LifecycleEvent::CancelRequested => return self.cancel(id, caller, None).await,
            LifecycleEvent::PaymentSucceeded
            | LifecycleEvent::PaymentFailed
            | LifecycleEvent::PaymentTimedOut => {
                return Err(BookingError::Unauthorized {
                    user_id: caller.user_id,
                    action: "submit settlement events",
                });
            }
            LifecycleEvent::CheckIn | LifecycleEvent::CheckOut => {
                require_privilege(caller, "check guests in or out")?;
            }
        }

        let room_type_id = self
            .inner
            .ledger
            .get(id)
            .ok_or(BookingError::ReservationNotFound(id))?
            .room_type_id;
        let _slot = self.inner.slots.acquire(room_type_id).await?;

        let machine = self.inner.machine;
        let now = self.inner.clock.now();
        let reservation = self
            .inner
            .ledger
            .update(id, |r| machine.apply(r, event, now).map(|_| ()))?;

        BookingMetrics::record_reservation(match event {
            LifecycleEvent::CheckIn => "checked_in",
            _ => "checked_out",
        });
        tracing::info!(status = %reservation.status, "Reservation {event} recorded");
        Ok(reservation)
    }

    /// Refund the caller would receive if the reservation were cancelled now.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] or [`BookingError::Unauthorized`].
    pub fn refund_quote(
        &self,
        id: ReservationId,
        caller: &Caller,
    ) -> BookingResult<Option<RefundQuote>> {
        let reservation = self.reservation(id, caller)?;
        Ok(self.inner.refunds.quote(&reservation, self.inner.clock.now()))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// A reservation, visible to its owner and staff.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] or [`BookingError::Unauthorized`].
    pub fn reservation(&self, id: ReservationId, caller: &Caller) -> BookingResult<Reservation> {
        let reservation = self
            .inner
            .ledger
            .get(id)
            .ok_or(BookingError::ReservationNotFound(id))?;
        if caller.can_access(&reservation) {
            Ok(reservation)
        } else {
            Err(BookingError::Unauthorized {
                user_id: caller.user_id,
                action: "view this reservation",
            })
        }
    }

    /// Reservations owned by `user_id`, oldest first
    #[must_use]
    pub fn reservations_for_user(&self, user_id: UserId) -> Vec<Reservation> {
        self.inner.ledger.for_user(user_id)
    }

    /// Reservations whose stay shares a night with `[from, to)` (staff only).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`] or [`BookingError::InvalidDateRange`].
    pub fn reservations_in_range(
        &self,
        caller: &Caller,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BookingResult<Vec<Reservation>> {
        require_privilege(caller, "list reservations by date")?;
        Ok(self.inner.ledger.overlapping(StayDates::new(from, to)?))
    }

    /// Every reservation, newest first (staff only).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`] for guests.
    pub fn all_reservations(&self, caller: &Caller) -> BookingResult<Vec<Reservation>> {
        require_privilege(caller, "list all reservations")?;
        Ok(self.inner.ledger.all())
    }

    /// Payments of `user_id`'s reservations, oldest first
    #[must_use]
    pub fn payment_history(&self, user_id: UserId) -> Vec<Payment> {
        self.inner
            .ledger
            .for_user(user_id)
            .into_iter()
            .map(|reservation| reservation.payment)
            .collect()
    }

    /// A payment, visible to the reservation owner and staff. `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`] for other guests.
    pub fn payment(
        &self,
        payment_id: PaymentId,
        caller: &Caller,
    ) -> BookingResult<Option<Payment>> {
        match self.inner.ledger.payment(payment_id) {
            Some((owner, payment)) if owner == caller.user_id || caller.is_privileged() => {
                Ok(Some(payment))
            }
            Some(_) => Err(BookingError::Unauthorized {
                user_id: caller.user_id,
                action: "view this payment",
            }),
            None => Ok(None),
        }
    }

    /// Reservation counts and payment totals (staff only).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Unauthorized`] for guests.
    pub fn statistics(&self, caller: &Caller) -> BookingResult<ReservationStatistics> {
        require_privilege(caller, "view statistics")?;
        Ok(self.inner.ledger.statistics())
    }
}

fn require_privilege(caller: &Caller, action: &'static str) -> BookingResult<()> {
    if caller.is_privileged() {
        Ok(())
    } else {
        Err(BookingError::Unauthorized {
            user_id: caller.user_id,
            action,
        })
    }
}

fn check_guests(room: &RoomType, guests: u32) -> BookingResult<()> {
    if guests == 0 {
        return Err(BookingError::NoGuests);
    }
    if guests > room.capacity {
        return Err(BookingError::GuestCountExceeded {
            requested: guests,
            capacity: room.capacity,
        });
    }
    Ok(())
}

/// Checks the party fits and prices the stay
fn price_stay(room: &RoomType, stay: StayDates, guests: u32) -> BookingResult<Money> {
    check_guests(room, guests)?;
    room.price_for(&stay)
        .ok_or_else(|| BookingError::InvalidDateRange {
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            reason: "stay is too long to price".to_string(),
        })
}
