//! Domain types for hotel room booking.
//!
//! Value objects, entities and caller identity. Reservations refer to room types and
//! users through opaque identifiers only; reverse lookups are the job of the index
//! structures in the runtime crate.

use crate::error::BookingError;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Identifies a bookable room category
    RoomTypeId
);
uuid_identifier!(
    /// Identifies a reservation
    ReservationId
);
uuid_identifier!(
    /// Identifies a payment attempt
    PaymentId
);
uuid_identifier!(
    /// Identifies a user (guest or staff)
    UserId
);

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars, saturating at `u64::MAX` cents
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, `None` on overflow
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two amounts, clamping at the maximum representable value
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts, clamping at zero
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiplies by a quantity (e.g. a number of nights), `None` on overflow
    #[must_use]
    pub const fn checked_multiply(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Returns `percent`% of this amount, rounded down to the cent.
    ///
    /// Percentages above 100 are clamped to 100, so the result never exceeds `self`.
    #[must_use]
    pub const fn percent(self, percent: u8) -> Self {
        let percent = if percent > 100 { 100 } else { percent as u64 };
        // Split to keep the multiplication inside u64 for large amounts.
        let whole = (self.0 / 100) * percent;
        let rest = (self.0 % 100) * percent / 100;
        Self(whole + rest)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Stay dates
// ============================================================================

/// A half-open range of nights `[check_in, check_out)`.
///
/// The night of `check_out` is not part of the stay, so a stay ending on day `D`
/// never conflicts with one starting on `D`. Deserialization applies the same check as
/// [`StayDates::new`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStayDates")]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    /// Creates a stay, requiring `check_out > check_in`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] if `check_out <= check_in`.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        if check_out <= check_in {
            return Err(BookingError::InvalidDateRange {
                check_in,
                check_out,
                reason: "check-out must be after check-in".to_string(),
            });
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Creates a stay that may be booked on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidDateRange`] if the range is empty or inverted,
    /// or if `check_in` is before `today`.
    pub fn bookable(
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, BookingError> {
        let stay = Self::new(check_in, check_out)?;
        if check_in < today {
            return Err(BookingError::InvalidDateRange {
                check_in,
                check_out,
                reason: format!("check-in is in the past (today is {today})"),
            });
        }
        Ok(stay)
    }

    /// First night of the stay
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// Departure day (not a night of the stay)
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights in the stay (always at least one)
    #[must_use]
    pub fn nights(&self) -> u32 {
        let days = (self.check_out - self.check_in).num_days();
        u32::try_from(days).unwrap_or(u32::MAX)
    }

    /// Whether the two stays share at least one night
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Whether `night` is one of the nights of this stay
    #[must_use]
    pub fn contains_night(&self, night: NaiveDate) -> bool {
        self.check_in <= night && night < self.check_out
    }

    /// Iterates over every night of the stay, in order
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.check_in
            .iter_days()
            .take_while(move |night| *night < self.check_out)
    }

    /// The last night of the stay
    #[must_use]
    pub fn last_night(&self) -> NaiveDate {
        self.check_out
            .checked_sub_days(Days::new(1))
            .unwrap_or(self.check_in)
    }
}

#[derive(Deserialize)]
struct RawStayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<RawStayDates> for StayDates {
    type Error = BookingError;

    fn try_from(raw: RawStayDates) -> Result<Self, Self::Error> {
        Self::new(raw.check_in, raw.check_out)
    }
}

impl fmt::Display for StayDates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

// ============================================================================
// Room catalog entities
// ============================================================================

/// Category of room
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    /// Standard rooms
    Standard,
    /// Deluxe rooms
    Deluxe,
    /// Suites
    Suite,
}

/// A bookable room category with a countable number of identical units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    /// Unique identifier
    pub id: RoomTypeId,
    /// Display name (e.g., "Deluxe Ocean View Suite")
    pub name: String,
    /// Category
    pub kind: RoomKind,
    /// Free-form description
    pub description: String,
    /// Price for one unit for one night
    pub price_per_night: Money,
    /// Maximum occupants per unit
    pub capacity: u32,
    /// Number of identical units that can be sold per night
    pub total_rooms: u32,
    /// Floor area in square metres, when known
    pub size_sqm: Option<u32>,
    /// Amenity labels
    pub amenities: Vec<String>,
}

impl RoomType {
    /// Creates a room type with a fresh identifier and no description or amenities
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: RoomKind,
        price_per_night: Money,
        capacity: u32,
        total_rooms: u32,
    ) -> Self {
        Self {
            id: RoomTypeId::new(),
            name: name.into(),
            kind,
            description: String::new(),
            price_per_night,
            capacity,
            total_rooms,
            size_sqm: None,
            amenities: Vec::new(),
        }
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the floor area
    #[must_use]
    pub const fn with_size_sqm(mut self, size_sqm: u32) -> Self {
        self.size_sqm = Some(size_sqm);
        self
    }

    /// Sets the amenities
    #[must_use]
    pub fn with_amenities<I, S>(mut self, amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.amenities = amenities.into_iter().map(Into::into).collect();
        self
    }

    /// Total price of `stay` for one unit.
    ///
    /// Returns `None` if the amount does not fit in `u64` cents.
    #[must_use]
    pub fn price_for(&self, stay: &StayDates) -> Option<Money> {
        self.price_per_night.checked_multiply(stay.nights())
    }
}

/// Catalog search criteria. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomFilter {
    /// Only rooms of this kind
    pub kind: Option<RoomKind>,
    /// Minimum nightly price (inclusive)
    pub min_price: Option<Money>,
    /// Maximum nightly price (inclusive)
    pub max_price: Option<Money>,
    /// Only rooms that fit at least this many guests
    pub min_occupancy: Option<u32>,
}

impl RoomFilter {
    /// Whether `room` satisfies every set criterion
    #[must_use]
    pub fn matches(&self, room: &RoomType) -> bool {
        self.kind.is_none_or(|kind| room.kind == kind)
            && self.min_price.is_none_or(|min| room.price_per_night >= min)
            && self.max_price.is_none_or(|max| room.price_per_night <= max)
            && self.min_occupancy.is_none_or(|guests| room.capacity >= guests)
    }
}

// ============================================================================
// Reservations and payments
// ============================================================================

/// Reservation lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Created and holding inventory, waiting for settlement
    PendingPayment,
    /// Paid
    Confirmed,
    /// Guest has arrived
    CheckedIn,
    /// Guest has left (terminal)
    CheckedOut,
    /// Cancelled or expired (terminal)
    Cancelled,
}

impl ReservationStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [Self; 5] = [
        Self::PendingPayment,
        Self::Confirmed,
        Self::CheckedIn,
        Self::CheckedOut,
        Self::Cancelled,
    ];

    /// Whether a reservation in this status holds an inventory unit
    #[must_use]
    pub const fn holds_inventory(self) -> bool {
        matches!(self, Self::PendingPayment | Self::Confirmed | Self::CheckedIn)
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CheckedOut | Self::Cancelled)
    }

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::CheckedOut => "CHECKED_OUT",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment settlement status
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Intent created, not settled
    Pending,
    /// Funds captured
    Succeeded,
    /// Settlement failed, timed out or was voided by cancellation
    Failed,
    /// Funds (partially) returned
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        })
    }
}

/// A settlement attempt owned by a reservation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Owning reservation
    pub reservation_id: ReservationId,
    /// Amount to settle (equals the reservation total)
    pub amount: Money,
    /// Provider-side intent identifier, once created
    pub intent_id: Option<String>,
    /// Settlement status
    pub status: PaymentStatus,
    /// Amount returned to the guest
    pub refunded_amount: Money,
    /// Provider-side refund identifier
    pub refund_id: Option<String>,
    /// When the payment record was created
    pub created_at: DateTime<Utc>,
    /// When the payment record last changed
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment for `amount`
    #[must_use]
    pub fn pending(reservation_id: ReservationId, amount: Money, now: DateTime<Utc>) -> Self {
        Self {
            id: PaymentId::new(),
            reservation_id,
            amount,
            intent_id: None,
            status: PaymentStatus::Pending,
            refunded_amount: Money::ZERO,
            refund_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Captured amount net of refunds
    #[must_use]
    pub const fn net_captured(&self) -> Money {
        match self.status {
            PaymentStatus::Succeeded | PaymentStatus::Refunded => {
                self.amount.saturating_sub(self.refunded_amount)
            }
            PaymentStatus::Pending | PaymentStatus::Failed => Money::ZERO,
        }
    }
}

/// A booking of one unit of a room type for a stay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier
    pub id: ReservationId,
    /// Owning user
    pub user_id: UserId,
    /// Booked room type
    pub room_type_id: RoomTypeId,
    /// Nights booked
    pub stay: StayDates,
    /// Number of occupants
    pub number_of_guests: u32,
    /// Lifecycle status (changed only through the state machine)
    pub status: ReservationStatus,
    /// Price of the stay
    pub total_amount: Money,
    /// Guest's special requests
    pub notes: Option<String>,
    /// When the reservation was created
    pub created_at: DateTime<Utc>,
    /// When the reservation last changed
    pub updated_at: DateTime<Utc>,
    /// Why the reservation was cancelled
    pub cancellation_reason: Option<String>,
    /// When the reservation was cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Settlement attempt for this reservation
    pub payment: Payment,
}

impl Reservation {
    /// Creates a reservation in `PENDING_PAYMENT` with a pending payment of `total_amount`
    #[must_use]
    pub fn pending(
        user_id: UserId,
        room_type_id: RoomTypeId,
        stay: StayDates,
        number_of_guests: u32,
        total_amount: Money,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let id = ReservationId::new();
        Self {
            id,
            user_id,
            room_type_id,
            stay,
            number_of_guests,
            status: ReservationStatus::PendingPayment,
            total_amount,
            notes,
            created_at: now,
            updated_at: now,
            cancellation_reason: None,
            cancelled_at: None,
            payment: Payment::pending(id, total_amount, now),
        }
    }

    /// First night of the stay
    #[must_use]
    pub const fn check_in(&self) -> NaiveDate {
        self.stay.check_in()
    }

    /// Departure day
    #[must_use]
    pub const fn check_out(&self) -> NaiveDate {
        self.stay.check_out()
    }

    /// Whether this reservation's status holds an inventory unit
    #[must_use]
    pub const fn holds_inventory(&self) -> bool {
        self.status.holds_inventory()
    }

    /// Whether this reservation still holds a unit for some night from `today` on.
    ///
    /// A stay whose check-out day has arrived releases its unit even if nobody checked
    /// the guest out.
    #[must_use]
    pub fn holds_inventory_on(&self, today: NaiveDate) -> bool {
        self.holds_inventory() && self.check_out() > today
    }
}

// ============================================================================
// Caller identity
// ============================================================================

/// Role of the caller, supplied explicitly by the transport layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Hotel guest
    Guest,
    /// Front-desk manager
    Manager,
    /// Administrator
    Admin,
}

/// Who is asking. Authorization decisions are made against this value only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    /// Authenticated user
    pub user_id: UserId,
    /// Role of that user
    pub role: Role,
}

impl Caller {
    /// A guest caller
    #[must_use]
    pub const fn guest(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Guest,
        }
    }

    /// A manager caller
    #[must_use]
    pub const fn manager(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Manager,
        }
    }

    /// An admin caller
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Staff roles may act on any reservation
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self.role, Role::Manager | Role::Admin)
    }

    /// Owner or staff
    #[must_use]
    pub fn can_access(&self, reservation: &Reservation) -> bool {
        self.is_privileged() || reservation.user_id == self.user_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn stay_rejects_empty_and_inverted_ranges() {
        assert!(matches!(
            StayDates::new(day(5), day(5)),
            Err(BookingError::InvalidDateRange { .. })
        ));
        assert!(matches!(
            StayDates::new(day(6), day(5)),
            Err(BookingError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn bookable_stay_allows_today_but_not_yesterday() {
        assert!(StayDates::bookable(day(10), day(11), day(10)).is_ok());
        assert!(matches!(
            StayDates::bookable(day(9), day(11), day(10)),
            Err(BookingError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn adjacent_stays_do_not_overlap() {
        let first = StayDates::new(day(1), day(3)).unwrap();
        let second = StayDates::new(day(3), day(5)).unwrap();
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));

        let third = StayDates::new(day(2), day(4)).unwrap();
        assert!(first.overlaps(&third));
        assert!(third.overlaps(&first));
    }

    #[test]
    fn nights_are_half_open() {
        let stay = StayDates::new(day(10), day(13)).unwrap();
        assert_eq!(stay.nights(), 3);
        assert_eq!(
            stay.nights_iter().collect::<Vec<_>>(),
            vec![day(10), day(11), day(12)]
        );
        assert!(stay.contains_night(day(12)));
        assert!(!stay.contains_night(day(13)));
        assert_eq!(stay.last_night(), day(12));
    }

    #[test]
    fn money_percent_rounds_down_and_clamps() {
        let amount = Money::from_cents(30_001);
        assert_eq!(amount.percent(50), Money::from_cents(15_000));
        assert_eq!(amount.percent(0), Money::ZERO);
        assert_eq!(amount.percent(100), amount);
        assert_eq!(amount.percent(250), amount);
        assert_eq!(Money::from_cents(u64::MAX).percent(100).cents(), u64::MAX);
    }

    #[test]
    fn money_display_uses_dollars_and_cents() {
        assert_eq!(Money::from_cents(29_999).to_string(), "$299.99");
        assert_eq!(Money::from_dollars(3).to_string(), "$3.00");
    }

    #[test]
    fn stay_deserialization_rejects_inverted_ranges() {
        let parse = |check_in: &str, check_out: &str| {
            let json = format!(r#"{{"check_in":"{check_in}","check_out":"{check_out}"}}"#);
            serde_json::from_str::<StayDates>(&json)
        };

        assert_eq!(parse("2025-01-03", "2025-01-05").unwrap().nights(), 2);
        assert!(parse("2025-01-05", "2025-01-03").is_err());
        assert!(parse("2025-01-05", "2025-01-05").is_err());
    }

    #[test]
    fn room_price_multiplies_nights() {
        let room = RoomType::new(
            "Standard Double Room",
            RoomKind::Standard,
            Money::from_cents(14_999),
            2,
            10,
        );
        let stay = StayDates::new(day(1), day(4)).unwrap();
        assert_eq!(room.price_for(&stay), Some(Money::from_cents(44_997)));
    }

    #[test]
    fn room_filter_matches_every_set_criterion() {
        let room = RoomType::new(
            "Deluxe Ocean View Suite",
            RoomKind::Deluxe,
            Money::from_cents(29_999),
            4,
            3,
        );
        let filter = |change: fn(&mut RoomFilter)| {
            let mut filter = RoomFilter::default();
            change(&mut filter);
            filter
        };

        assert!(RoomFilter::default().matches(&room));
        assert!(filter(|f| f.kind = Some(RoomKind::Deluxe)).matches(&room));
        assert!(!filter(|f| f.kind = Some(RoomKind::Suite)).matches(&room));
        assert!(!filter(|f| f.max_price = Some(Money::from_dollars(200))).matches(&room));
        assert!(filter(|f| f.min_occupancy = Some(4)).matches(&room));
        assert!(!filter(|f| f.min_occupancy = Some(5)).matches(&room));
    }

    #[test]
    fn ended_stays_stop_holding_inventory() {
        let reservation = Reservation::pending(
            UserId::new(),
            RoomTypeId::new(),
            StayDates::new(day(1), day(3)).unwrap(),
            1,
            Money::from_dollars(100),
            None,
            Utc::now(),
        );
        assert!(reservation.holds_inventory_on(day(2)));
        assert!(!reservation.holds_inventory_on(day(3)));
    }

    #[test]
    fn statuses_serialize_in_wire_form() {
        let json = serde_json::to_string(&ReservationStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"PENDING_PAYMENT\"");
        for status in ReservationStatus::ALL {
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{status}\""));
        }
    }

    #[test]
    fn only_owner_or_staff_can_access() {
        let owner = UserId::new();
        let stay = StayDates::new(day(1), day(2)).unwrap();
        let reservation = Reservation::pending(
            owner,
            RoomTypeId::new(),
            stay,
            1,
            Money::from_dollars(100),
            None,
            Utc::now(),
        );

        assert!(Caller::guest(owner).can_access(&reservation));
        assert!(!Caller::guest(UserId::new()).can_access(&reservation));
        assert!(Caller::manager(UserId::new()).can_access(&reservation));
        assert!(Caller::admin(UserId::new()).can_access(&reservation));
    }
}
