//! Gateway resolution
//!
//! Picks the adapter that handles a delivery: the first configured adapter
//! whose validity check accepts the payload. No storage is touched here, so an
//! unrecognised delivery fails before any lookups happen.

use crate::gateway::GatewayAdapter;
use crate::types::{Payload, SubscriptionError};

/// Find the first adapter that recognises the payload
///
/// # Arguments
///
/// * `adapters` - Configured adapters, in configuration order
/// * `payload` - The delivery's fields
///
/// # Errors
///
/// Returns `SubscriptionError::UnknownGateway` if no adapter accepts it.
pub fn resolve_gateway<'a>(
    adapters: &'a [Box<dyn GatewayAdapter>],
    payload: &Payload,
) -> Result<&'a dyn GatewayAdapter, SubscriptionError> {
    adapters
        .iter()
        .find(|adapter| adapter.is_valid(payload))
        .map(|adapter| adapter.as_ref())
        .ok_or(SubscriptionError::UnknownGateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{PaypalGateway, TwoCheckoutGateway};

    fn adapters() -> Vec<Box<dyn GatewayAdapter>> {
        vec![
            Box::new(TwoCheckoutGateway::new("901")),
            Box::new(PaypalGateway::new("pay@example.com", Vec::new(), "usd")),
        ]
    }

    #[test]
    fn test_selects_matching_adapter() {
        let payload = Payload::from_pairs([("txn_type", "web_accept"), ("business", "pay@example.com")]);

        let adapters = adapters();
        let adapter = resolve_gateway(&adapters, &payload).unwrap();

        assert_eq!(adapter.code(), "paypal");
    }

    #[test]
    fn test_first_valid_adapter_wins() {
        // Recognised by both gateways; 2co is configured first.
        let payload = Payload::from_pairs([
            ("sid", "901"),
            ("x_invoice_num", "1+2"),
            ("txn_type", "web_accept"),
            ("business", "pay@example.com"),
        ]);

        let adapters = adapters();
        let adapter = resolve_gateway(&adapters, &payload).unwrap();

        assert_eq!(adapter.code(), "2co");
    }

    #[test]
    fn test_no_valid_adapter_is_unknown_gateway() {
        let payload = Payload::from_pairs([("foo", "bar")]);

        let adapters = adapters();
        let result = resolve_gateway(&adapters, &payload);

        assert_eq!(result.err(), Some(SubscriptionError::UnknownGateway));
    }

    #[test]
    fn test_no_adapters_configured() {
        let result = resolve_gateway(&[], &Payload::from_pairs([("a", "b")]));
        assert_eq!(result.err(), Some(SubscriptionError::UnknownGateway));
    }
}
