//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `plan`: Subscription plans, cost tables and durations
//! - `log`: Per-member subscription log rows and pending payments
//! - `member`: Member identity records
//! - `request`: The inbound webhook request context
//! - `error`: Error types for the webhook processor

pub mod error;
pub mod log;
pub mod member;
pub mod plan;
pub mod request;

pub use error::{
    ConfigError, GatewayError, NotifyError, ServiceError, StoreError, SubscriptionError,
};
pub use log::{PendingKind, PendingPayment, SubscriptionLog, SubscriptionStatus};
pub use member::Member;
pub use plan::{CostTable, DurationPrice, DurationUnit, PlanLength, SubscriptionPlan};
pub use request::{Payload, RequestContext};

/// Subscription plan identifier
pub type SubscriptionId = u32;

/// Member identifier
pub type MemberId = u32;

/// Subscription log row identifier
pub type SubscriptionLogId = u32;

/// Unix timestamp in seconds
pub type Timestamp = i64;
