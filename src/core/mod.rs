//! Core business logic module
//!
//! This module contains the webhook reconciliation components:
//! - `traits` - Storage abstraction for interchangeable backends
//! - `engine` - Delivery processing orchestration
//! - `resolver` - Picks the gateway adapter for a delivery
//! - `cost_matching` - Matches a paid amount against a plan's prices
//! - `period` - Moves a subscription's active period
//! - `memory_store` - HashMap-backed storage

pub mod cost_matching;
pub mod engine;
pub mod memory_store;
pub mod period;
pub mod resolver;
pub mod traits;

pub use engine::{Outcome, Reconciliation, ReconciliationEngine};
pub use memory_store::InMemoryStore;
pub use traits::SubscriptionStore;
