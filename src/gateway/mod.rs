//! Payment gateway adapters
//!
//! Each adapter understands one payment provider's webhook contract. The
//! resolver asks every configured adapter, in order, whether a delivery looks
//! like one of its own; the first that says yes handles the whole delivery.
//!
//! # Components
//!
//! - `registry` - Maps gateway codes to adapter factories
//! - `paypal` - PayPal Instant Payment Notification
//! - `two_checkout` - 2Checkout order notifications

pub mod paypal;
pub mod registry;
pub mod two_checkout;

pub use paypal::PaypalGateway;
pub use registry::{GatewayFactory, GatewayRegistry};
pub use two_checkout::TwoCheckoutGateway;

use crate::core::traits::SubscriptionStore;
use crate::types::{
    GatewayError, MemberId, Payload, StoreError, SubscriptionId, SubscriptionLog, Timestamp,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Raw (subscription, member) identifiers as the provider sent them
///
/// Coercion to integers happens in the engine, not in the adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIds {
    pub subscription: String,
    pub member: String,
}

impl RawIds {
    /// Split a `<subscription>+<member>` reference; a missing half is empty
    pub fn from_reference(reference: &str) -> Self {
        let mut parts = reference.splitn(2, '+');
        RawIds {
            subscription: parts.next().unwrap_or_default().to_string(),
            member: parts.next().unwrap_or_default().to_string(),
        }
    }
}

/// One payment provider's webhook contract
pub trait GatewayAdapter {
    /// Code the gateway is registered and configured under
    fn code(&self) -> &'static str;

    /// Whether the delivery has this provider's expected shape
    fn is_valid(&self, payload: &Payload) -> bool;

    /// Extract the subscription and member the delivery is about
    fn precheck(&self, payload: &Payload) -> Result<RawIds, GatewayError>;

    fn is_refund(&self, payload: &Payload) -> bool;

    /// One-off payment
    fn is_payment(&self, payload: &Payload) -> bool;

    /// Recurring subscription payment
    fn is_subscription(&self, payload: &Payload) -> bool;

    fn is_cancellation(&self, payload: &Payload) -> bool;

    /// Amount the provider reports as paid
    fn cost(&self, payload: &Payload) -> Decimal;

    /// Provider-specific cancellation bookkeeping; does nothing unless overridden
    fn process_cancellation(
        &self,
        _store: &mut dyn SubscriptionStore,
        _subscription_id: SubscriptionId,
        _member_id: MemberId,
        _log: &SubscriptionLog,
        _now: Timestamp,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    /// Called once the delivery has been handled
    fn close(&self, _payload: &Payload) {}
}

/// Kind of transaction a delivery carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Refund,
    /// One-off payment, guarded against double processing
    Payment,
    /// Recurring payment
    SubscriptionRenewal,
    Cancellation,
    /// Informational notification with nothing to record
    Unrecognized,
}

/// Classify a delivery with the adapter that recognised it
///
/// Precedence is fixed: refund, then payment or renewal, then cancellation.
/// A delivery that is both a payment and a renewal counts as a renewal.
pub fn classify(adapter: &dyn GatewayAdapter, payload: &Payload) -> TransactionKind {
    if adapter.is_refund(payload) {
        TransactionKind::Refund
    } else if adapter.is_subscription(payload) {
        TransactionKind::SubscriptionRenewal
    } else if adapter.is_payment(payload) {
        TransactionKind::Payment
    } else if adapter.is_cancellation(payload) {
        TransactionKind::Cancellation
    } else {
        TransactionKind::Unrecognized
    }
}

/// Parse a provider amount, treating anything unparseable as zero
pub(crate) fn parse_amount(value: Option<&str>) -> Decimal {
    value
        .and_then(|v| Decimal::from_str(v.trim()).ok())
        .unwrap_or(Decimal::ZERO)
}
