//! Refund policies.
//!
//! How much of a captured payment goes back to the guest is a function of how long
//! before check-in the cancellation happens. The policy is injected, so hotels can swap
//! the default tiers for any rule expressible as `(lead time, settled amount) -> refund`.

use crate::types::Money;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Computes the refundable part of a settled payment
pub trait RefundPolicy: Send + Sync {
    /// Refund owed when cancelling `lead_time` before check-in.
    ///
    /// `lead_time` is negative once check-in has passed. Implementations may return
    /// more than `settled`; callers clamp the result.
    fn refundable_amount(&self, lead_time: TimeDelta, settled: Money) -> Money;
}

impl<F> RefundPolicy for F
where
    F: Fn(TimeDelta, Money) -> Money + Send + Sync,
{
    fn refundable_amount(&self, lead_time: TimeDelta, settled: Money) -> Money {
        self(lead_time, settled)
    }
}

/// Refund `percent`% when cancelling at least `min_notice_hours` before check-in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTier {
    /// Minimum notice, in hours
    pub min_notice_hours: i64,
    /// Share of the settled amount returned
    pub percent: u8,
}

impl RefundTier {
    /// Creates a tier
    #[must_use]
    pub const fn new(min_notice_hours: i64, percent: u8) -> Self {
        Self {
            min_notice_hours,
            percent,
        }
    }
}

/// Step-function policy: the first tier whose notice is satisfied wins.
///
/// Tiers are kept sorted by descending notice. With no satisfied tier the refund is
/// zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredRefundPolicy {
    tiers: Vec<RefundTier>,
}

impl TieredRefundPolicy {
    /// Creates a policy from tiers in any order
    #[must_use]
    pub fn new(mut tiers: Vec<RefundTier>) -> Self {
        tiers.sort_by(|a, b| b.min_notice_hours.cmp(&a.min_notice_hours));
        Self { tiers }
    }

    /// Full refund with `full_notice_hours` notice, `partial_percent`% with
    /// `partial_notice_hours`, nothing after that
    #[must_use]
    pub fn standard(
        full_notice_hours: i64,
        partial_notice_hours: i64,
        partial_percent: u8,
    ) -> Self {
        Self::new(vec![
            RefundTier::new(full_notice_hours, 100),
            RefundTier::new(partial_notice_hours, partial_percent),
        ])
    }

    /// Tiers, longest notice first
    #[must_use]
    pub fn tiers(&self) -> &[RefundTier] {
        &self.tiers
    }

    /// Percentage owed for `lead_time`
    #[must_use]
    pub fn percent_for(&self, lead_time: TimeDelta) -> u8 {
        let hours = lead_time.num_hours();
        // num_hours truncates toward zero; a lead of -30 minutes must not pass a 0h tier.
        let satisfied = |tier: &&RefundTier| {
            hours > tier.min_notice_hours
                || (hours == tier.min_notice_hours
                    && lead_time >= TimeDelta::hours(tier.min_notice_hours))
        };
        self.tiers
            .iter()
            .find(satisfied)
            .map_or(0, |tier| tier.percent)
    }
}

impl Default for TieredRefundPolicy {
    /// 100% with 72 hours notice, 50% with 24 hours, nothing later
    fn default() -> Self {
        Self::standard(72, 24, 50)
    }
}

impl RefundPolicy for TieredRefundPolicy {
    fn refundable_amount(&self, lead_time: TimeDelta, settled: Money) -> Money {
        settled.percent(self.percent_for(lead_time))
    }
}

/// Outcome of applying a refund policy to one cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefundQuote {
    /// Time between the cancellation and check-in (midnight UTC of the check-in day)
    pub lead_time: TimeDelta,
    /// Amount captured by the payment
    pub settled: Money,
    /// Amount to return, never more than `settled`
    pub amount: Money,
}

impl RefundQuote {
    /// Quotes the refund for cancelling at `now` a stay starting on `check_in`
    #[must_use]
    pub fn compute(
        policy: &dyn RefundPolicy,
        check_in: NaiveDate,
        now: DateTime<Utc>,
        settled: Money,
    ) -> Self {
        let lead_time = check_in.and_time(NaiveTime::MIN).and_utc() - now;
        let amount = policy.refundable_amount(lead_time, settled).min(settled);
        Self {
            lead_time,
            settled,
            amount,
        }
    }

    /// Nothing to return
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Everything returned
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.amount == self.settled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn check_in() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn days_before(days: i64) -> DateTime<Utc> {
        check_in().and_time(NaiveTime::MIN).and_utc() - TimeDelta::days(days)
    }

    #[test]
    fn default_policy_steps_down_with_notice() {
        let policy = TieredRefundPolicy::default();
        assert_eq!(policy.percent_for(TimeDelta::days(10)), 100);
        assert_eq!(policy.percent_for(TimeDelta::hours(72)), 100);
        assert_eq!(policy.percent_for(TimeDelta::hours(71)), 50);
        assert_eq!(policy.percent_for(TimeDelta::hours(24)), 50);
        assert_eq!(policy.percent_for(TimeDelta::hours(23)), 0);
        assert_eq!(policy.percent_for(TimeDelta::hours(-5)), 0);
    }

    #[test]
    fn boundary_uses_exact_duration_not_truncated_hours() {
        let policy = TieredRefundPolicy::new(vec![RefundTier::new(0, 10)]);
        assert_eq!(policy.percent_for(TimeDelta::minutes(30)), 10);
        assert_eq!(policy.percent_for(TimeDelta::zero()), 10);
        assert_eq!(policy.percent_for(TimeDelta::minutes(-30)), 0);
    }

    #[test]
    fn tiers_are_sorted_regardless_of_input_order() {
        let policy =
            TieredRefundPolicy::new(vec![RefundTier::new(24, 25), RefundTier::new(72, 50)]);
        assert_eq!(policy.tiers()[0].min_notice_hours, 72);
        assert_eq!(policy.percent_for(TimeDelta::days(4)), 50);
    }

    #[test]
    fn partial_refund_two_days_out() {
        // 50% beyond three days, 25% between one and three days, nothing within a day.
        let policy = TieredRefundPolicy::new(vec![
            RefundTier::new(72, 50),
            RefundTier::new(24, 25),
        ]);
        let settled = Money::from_dollars(300);
        let quote = RefundQuote::compute(&policy, check_in(), days_before(2), settled);

        assert_eq!(quote.lead_time, TimeDelta::days(2));
        assert_eq!(quote.amount, Money::from_dollars(75));
        assert!(!quote.is_zero());
        assert!(!quote.is_full());
    }

    #[test]
    fn closures_are_policies_and_results_are_clamped() {
        let generous =
            |_: TimeDelta, settled: Money| settled.saturating_add(Money::from_dollars(1));
        let settled = Money::from_dollars(100);
        let quote = RefundQuote::compute(&generous, check_in(), days_before(1), settled);
        assert_eq!(quote.amount, settled);
        assert!(quote.is_full());
    }
}
