//! In-memory subscription store
//!
//! Keeps members, plans and log rows in HashMaps. Used by tests and by
//! embedders that load state from somewhere other than the CSV tables.

use crate::core::traits::SubscriptionStore;
use crate::types::{
    Member, MemberId, StoreError, SubscriptionId, SubscriptionLog, SubscriptionLogId,
    SubscriptionPlan,
};
use std::collections::HashMap;

/// HashMap-backed implementation of [`SubscriptionStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    members: HashMap<MemberId, Member>,
    plans: HashMap<SubscriptionId, SubscriptionPlan>,
    logs: HashMap<SubscriptionLogId, SubscriptionLog>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_member(&mut self, member: Member) {
        self.members.insert(member.id, member);
    }

    pub fn insert_plan(&mut self, plan: SubscriptionPlan) {
        self.plans.insert(plan.id, plan);
    }

    /// Insert or replace a log row
    pub fn insert_log(&mut self, log: SubscriptionLog) {
        self.logs.insert(log.id, log);
    }

    /// Log row by its own ID
    pub fn log(&self, id: SubscriptionLogId) -> Option<&SubscriptionLog> {
        self.logs.get(&id)
    }
}

impl SubscriptionStore for InMemoryStore {
    fn member(&self, member_id: MemberId) -> Result<Option<Member>, StoreError> {
        Ok(self.members.get(&member_id).cloned())
    }

    fn plan(&self, subscription_id: SubscriptionId) -> Result<Option<SubscriptionPlan>, StoreError> {
        Ok(self.plans.get(&subscription_id).cloned())
    }

    fn subscription_log(
        &self,
        subscription_id: SubscriptionId,
        member_id: MemberId,
    ) -> Result<Option<SubscriptionLog>, StoreError> {
        // Lowest row ID wins if the pair is duplicated.
        Ok(self
            .logs
            .values()
            .filter(|log| log.subscription_id == subscription_id && log.member_id == member_id)
            .min_by_key(|log| log.id)
            .cloned())
    }

    fn save_subscription_log(&mut self, log: &SubscriptionLog) -> Result<(), StoreError> {
        let stored = self.logs.get_mut(&log.id).ok_or(StoreError::MissingRow {
            table: "log_subscribed",
            row_id: log.id,
        })?;
        *stored = log.clone();
        Ok(())
    }
}
