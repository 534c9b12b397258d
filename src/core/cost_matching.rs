//! Matching a paid amount against a plan's cost table
//!
//! Flexible plans are matched by exact price: the first period whose price
//! equals the amount paid decides how long the subscription is extended.
//! Fixed plans accept any non-zero payment of at least the fixed price.
//!
//! A payment that matches nothing is not an error. The gateway has already
//! taken the money, so the caller logs it and leaves the subscription alone.

use crate::types::{DurationUnit, PlanLength, SubscriptionPlan};
use rust_decimal::Decimal;

/// Result of matching a payment against a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostMatch {
    /// Flexible plan: extend by one unit of this period
    Duration(DurationUnit),
    /// Fixed plan: extend by the plan length
    Fixed { seconds: i64 },
    /// No extension
    Unmatched(UnmatchedReason),
}

/// Why a payment produced no extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedReason {
    /// No flexible period is priced at the amount paid
    NoPeriodAtPrice,
    /// Fixed plan paid with zero or less than the fixed price
    Underpaid,
    /// Fixed plan without a fixed price
    NoFixedPrice,
}

/// Match a paid amount against a plan
///
/// # Arguments
///
/// * `plan` - The plan the payment is for
/// * `paid` - Amount reported by the gateway
pub fn match_payment(plan: &SubscriptionPlan, paid: Decimal) -> CostMatch {
    match plan.length {
        PlanLength::Flexible => plan
            .cost
            .durations
            .iter()
            .find(|entry| entry.price == paid)
            .and_then(|entry| entry.unit())
            .map(CostMatch::Duration)
            .unwrap_or(CostMatch::Unmatched(UnmatchedReason::NoPeriodAtPrice)),
        PlanLength::Fixed { count, unit } => match plan.cost.fixed {
            None => CostMatch::Unmatched(UnmatchedReason::NoFixedPrice),
            Some(required) if !paid.is_zero() && paid >= required => CostMatch::Fixed {
                seconds: i64::from(count) * unit.seconds(),
            },
            Some(_) => CostMatch::Unmatched(UnmatchedReason::Underpaid),
        },
    }
}
