//! Core traits for subscription storage
//!
//! The reconciliation engine and the gateway adapters only see storage through
//! this trait, so the CSV table store and the in-memory store can be used
//! interchangeably.

use crate::types::{
    Member, MemberId, StoreError, SubscriptionId, SubscriptionLog, SubscriptionPlan,
};

/// Trait for reading and updating subscription state
///
/// Members and plans are read-only. Log rows are read by their composite
/// (subscription, member) key and written back whole.
pub trait SubscriptionStore {
    /// Look up a member by ID
    fn member(&self, member_id: MemberId) -> Result<Option<Member>, StoreError>;

    /// Look up a subscription plan by ID
    fn plan(&self, subscription_id: SubscriptionId) -> Result<Option<SubscriptionPlan>, StoreError>;

    /// Look up the log row for a (subscription, member) pair
    fn subscription_log(
        &self,
        subscription_id: SubscriptionId,
        member_id: MemberId,
    ) -> Result<Option<SubscriptionLog>, StoreError>;

    /// Persist a log row, replacing the stored row with the same ID
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MissingRow` if no row with that ID exists; log rows
    /// are never created here.
    fn save_subscription_log(&mut self, log: &SubscriptionLog) -> Result<(), StoreError>;
}
