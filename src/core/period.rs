//! Subscription period bookkeeping
//!
//! Pure functions that move a log row's active period. The engine calls them
//! and persists the result; nothing here touches storage.

use crate::types::{SubscriptionLog, SubscriptionStatus, Timestamp};

/// What a refund did to the active period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundEffect {
    /// The period end moved back by the refunded length
    Shortened { end_time: Timestamp },
    /// Nothing of the period would be left, so it ended at `now`
    Ended { end_time: Timestamp },
}

/// Extend a member's subscription by `duration` seconds
///
/// An active row is extended from its current end, or from `now` if that end
/// has already passed, and keeps its start unless it never had one. An inactive
/// row starts a fresh period at `now`. The row becomes active either way.
pub fn extend(log: &mut SubscriptionLog, duration: i64, now: Timestamp) {
    if log.is_active() {
        log.end_time = log.end_time.max(now).saturating_add(duration);
        if log.start_time == 0 {
            log.start_time = now;
        }
    } else {
        log.start_time = now;
        log.end_time = now.saturating_add(duration);
    }
    log.status = SubscriptionStatus::Active;
}

/// Take a refunded period off a member's subscription
///
/// With `refunded` seconds known, the period end moves back by that much unless
/// that would put it in the past, in which case the subscription ends at `now`.
/// Flexible plans have no stored length (`None`) and always end at `now`.
pub fn refund(log: &mut SubscriptionLog, refunded: Option<i64>, now: Timestamp) -> RefundEffect {
    match refunded {
        Some(seconds) if log.end_time.saturating_sub(seconds) >= now => {
            log.end_time -= seconds;
            RefundEffect::Shortened {
                end_time: log.end_time,
            }
        }
        _ => {
            log.end_time = now;
            log.status = SubscriptionStatus::Inactive;
            RefundEffect::Ended { end_time: now }
        }
    }
}

/// Deactivate a row whose period already ran out
///
/// # Returns
///
/// `true` if the row changed
pub fn lapse_if_expired(log: &mut SubscriptionLog, now: Timestamp) -> bool {
    if log.is_active() && log.end_time < now {
        log.status = SubscriptionStatus::Inactive;
        true
    } else {
        false
    }
}
