//! Paid Subscriptions Webhook Library
//! # Overview
//!
//! This library reconciles payment gateway webhook deliveries (PayPal IPN,
//! 2Checkout notifications) against a forum's paid subscription state.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (plans, log rows, members, requests, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`config`] - TOML configuration
//! - [`gateway`] - Gateway adapter contract, bundled adapters and their registry
//! - [`core`] - Business logic components:
//!   - [`core::resolver`] - Picks the gateway for a delivery
//!   - [`core::engine`] - Pre-check, classification and reconciliation
//!   - [`core::cost_matching`] - Matches paid amounts against plan prices
//!   - [`core::period`] - Extends, shortens and lapses subscription periods
//! - [`io`] - CSV subscription tables and request body reading
//! - [`notify`] - Administrator notices and their delivery
//! - [`report`] - Error reporting
//! - [`service`] - One-delivery entry point tying it all together
//!
//! # Transaction Kinds
//!
//! A delivery recognised by a gateway is classified as one of:
//!
//! - **Refund**: Shorten the active period, or end it now
//! - **Payment**: One-off payment; consumes a pending payment, then extends
//! - **Subscription renewal**: Recurring payment; extends if the price matches
//! - **Cancellation**: Passed to the gateway adapter
//! - **Unrecognized**: Informational, nothing is recorded
//!
//! # Subscription State
//!
//! Each member's log row on a plan maintains:
//! - `start_time` / `end_time`: The active period
//! - `status`: Whether the subscription is active
//! - `pending_details`: One-off payments the forum is waiting for
//! - `payments_pending`: How many of those are paybacks

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod gateway;
pub mod io;
pub mod notify;
pub mod report;
pub mod service;
pub mod types;

pub use core::{InMemoryStore, Outcome, Reconciliation, ReconciliationEngine, SubscriptionStore};
pub use io::CsvTableStore;
pub use service::{Response, WebhookService};
pub use types::{
    MemberId, Payload, RequestContext, SubscriptionError, SubscriptionId, SubscriptionLog,
    SubscriptionPlan,
};
