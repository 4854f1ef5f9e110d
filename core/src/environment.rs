//! Injected dependencies.
//!
//! Anything that would make a booking operation non-deterministic (the current time,
//! in particular) is reached through a trait so tests can substitute a fixed or
//! manually advanced implementation.

use chrono::{DateTime, NaiveDate, Utc};

/// Clock trait - abstracts time operations for testability
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use hotel_booking_core::environment::Clock;
///
/// struct Frozen(DateTime<Utc>);
///
/// impl Clock for Frozen {
///     fn now(&self) -> DateTime<Utc> {
///         self.0
///     }
/// }
///
/// let at = DateTime::parse_from_rfc3339("2025-03-01T18:30:00Z").unwrap().with_timezone(&Utc);
/// assert_eq!(Frozen(at).today().to_string(), "2025-03-01");
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in UTC
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
