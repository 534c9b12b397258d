//! Subscription log types
//!
//! A log row tracks one member's state on one plan: the active period, whether
//! it is active, and the one-off payments the forum is still waiting for.

use super::{MemberId, SubscriptionId, SubscriptionLogId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whether the member currently holds the subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Inactive,
    Active,
}

impl SubscriptionStatus {
    /// Storage flag (`0` inactive, `1` active)
    pub fn as_flag(self) -> u8 {
        match self {
            SubscriptionStatus::Inactive => 0,
            SubscriptionStatus::Active => 1,
        }
    }

    /// Any non-zero flag counts as active
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 {
            SubscriptionStatus::Inactive
        } else {
            SubscriptionStatus::Active
        }
    }
}

/// Kind of an outstanding one-off payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    /// Paid up front before the subscription starts
    Prepay,
    /// Owed by a member who already holds the subscription; counted in
    /// `payments_pending`
    Payback,
}

/// Outstanding one-off payment awaiting confirmation from a gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// Plan the payment is for
    pub subscription_id: SubscriptionId,
    /// Amount the member was asked to pay
    pub amount: Decimal,
    /// `fixed`, or the flexible period key that was chosen
    pub duration: String,
    pub kind: PendingKind,
}

/// Per-member, per-plan subscription state
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionLog {
    pub id: SubscriptionLogId,
    pub subscription_id: SubscriptionId,
    pub member_id: MemberId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: SubscriptionStatus,
    /// Number of outstanding `payback` payments
    pub payments_pending: u32,
    pub pending_details: Vec<PendingPayment>,
}

impl SubscriptionLog {
    /// Create an inactive log row with nothing pending
    pub fn new(id: SubscriptionLogId, subscription_id: SubscriptionId, member_id: MemberId) -> Self {
        SubscriptionLog {
            id,
            subscription_id,
            member_id,
            start_time: 0,
            end_time: 0,
            status: SubscriptionStatus::Inactive,
            payments_pending: 0,
            pending_details: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Consume the first outstanding payment
    ///
    /// Removes the first stored detail regardless of its amount. A consumed
    /// `payback` decrements `payments_pending`, which never drops below zero.
    ///
    /// # Returns
    ///
    /// * `Some(PendingPayment)` - The detail that was removed
    /// * `None` - If nothing was pending
    pub fn consume_pending(&mut self) -> Option<PendingPayment> {
        if self.pending_details.is_empty() {
            return None;
        }

        let detail = self.pending_details.remove(0);
        if detail.kind == PendingKind::Payback && self.payments_pending > 0 {
            self.payments_pending -= 1;
        }

        Some(detail)
    }
}
