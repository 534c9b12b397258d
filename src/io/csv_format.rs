//! CSV format handling for the subscription tables
//!
//! This module centralizes the on-disk row formats, providing:
//! - Row structures for `subscriptions.csv`, `members.csv` and `log_subscribed.csv`
//! - Conversion between rows and domain types
//! - The versioned JSON encoding of the cost table and pending payment columns
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Serialized columns
//!
//! Structured columns hold JSON tagged with a format version, e.g.
//!
//! ```text
//! {"v":"1","fixed":null,"durations":[{"duration":"month","price":"10.00"}]}
//! {"v":"1","payments":[{"subscription_id":3,"amount":"10.00","duration":"month","kind":"payback"}]}
//! ```
//!
//! An empty pending payments column reads as an empty list.

use crate::types::{
    CostTable, DurationPrice, Member, MemberId, PendingPayment, PlanLength, StoreError,
    SubscriptionId, SubscriptionLog, SubscriptionLogId, SubscriptionPlan, SubscriptionStatus,
    Timestamp,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PLANS_TABLE: &str = "subscriptions";
pub const MEMBERS_TABLE: &str = "members";
pub const LOGS_TABLE: &str = "log_subscribed";

/// `subscriptions.csv` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRow {
    pub id_subscribe: SubscriptionId,
    pub name: String,
    /// Versioned cost table JSON
    pub cost: String,
    /// `F` or `<count><unit>`
    pub length: String,
}

/// `members.csv` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRow {
    pub id_member: MemberId,
    pub member_name: String,
    pub real_name: String,
    pub email_address: String,
}

/// `log_subscribed.csv` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub id_sublog: SubscriptionLogId,
    pub id_subscribe: SubscriptionId,
    pub id_member: MemberId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// `0` inactive, `1` active
    pub status: u8,
    pub payments_pending: u32,
    /// Versioned pending payments JSON, may be empty
    pub pending_details: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "v")]
enum CostColumn {
    #[serde(rename = "1")]
    V1 {
        fixed: Option<Decimal>,
        #[serde(default)]
        durations: Vec<DurationPrice>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "v")]
enum PendingColumn {
    #[serde(rename = "1")]
    V1 { payments: Vec<PendingPayment> },
}

/// Convert a `subscriptions.csv` row to a plan
///
/// # Errors
///
/// Returns `StoreError::CorruptColumn` if the cost table does not decode, names a
/// period whose unit is unknown, or the length is malformed.
pub fn plan_from_row(row: PlanRow) -> Result<SubscriptionPlan, StoreError> {
    let corrupt = |column, message: String| {
        StoreError::corrupt_column(PLANS_TABLE, row.id_subscribe, column, message)
    };

    let cost = match serde_json::from_str::<CostColumn>(&row.cost) {
        Ok(CostColumn::V1 { fixed, durations }) => CostTable { fixed, durations },
        Err(e) => return Err(corrupt("cost", e.to_string())),
    };
    if let Some(entry) = cost.durations.iter().find(|entry| entry.unit().is_none()) {
        return Err(corrupt(
            "cost",
            format!("unknown renewal period '{}'", entry.duration),
        ));
    }

    let length = row
        .length
        .parse::<PlanLength>()
        .map_err(|e| corrupt("length", e))?;

    Ok(SubscriptionPlan {
        id: row.id_subscribe,
        name: row.name,
        cost,
        length,
    })
}

/// Convert a `members.csv` row to a member
pub fn member_from_row(row: MemberRow) -> Member {
    Member {
        id: row.id_member,
        member_name: row.member_name,
        real_name: row.real_name,
        email: row.email_address,
    }
}

/// Convert a `log_subscribed.csv` row to a log row
///
/// # Errors
///
/// Returns `StoreError::CorruptColumn` if the pending payments column is
/// neither empty nor a supported version.
pub fn log_from_row(row: LogRow) -> Result<SubscriptionLog, StoreError> {
    let pending_details = if row.pending_details.trim().is_empty() {
        Vec::new()
    } else {
        match serde_json::from_str::<PendingColumn>(&row.pending_details) {
            Ok(PendingColumn::V1 { payments }) => payments,
            Err(e) => {
                return Err(StoreError::corrupt_column(
                    LOGS_TABLE,
                    row.id_sublog,
                    "pending_details",
                    e.to_string(),
                ))
            }
        }
    };

    Ok(SubscriptionLog {
        id: row.id_sublog,
        subscription_id: row.id_subscribe,
        member_id: row.id_member,
        start_time: row.start_time,
        end_time: row.end_time,
        status: SubscriptionStatus::from_flag(row.status),
        payments_pending: row.payments_pending,
        pending_details,
    })
}

/// Convert a log row back to its `log_subscribed.csv` form
///
/// The pending payments column is always written in the current version.
pub fn log_to_row(log: &SubscriptionLog) -> Result<LogRow, StoreError> {
    let column = PendingColumn::V1 {
        payments: log.pending_details.clone(),
    };
    let pending_details = serde_json::to_string(&column).map_err(|e| {
        StoreError::corrupt_column(LOGS_TABLE, log.id, "pending_details", e.to_string())
    })?;

    Ok(LogRow {
        id_sublog: log.id,
        id_subscribe: log.subscription_id,
        id_member: log.member_id,
        start_time: log.start_time,
        end_time: log.end_time,
        status: log.status.as_flag(),
        payments_pending: log.payments_pending,
        pending_details,
    })
}
