//! 2Checkout order notification adapter
//!
//! 2Checkout only sends completed one-off orders to the return URL, so there is
//! no refund, recurring or cancellation support.

use crate::config::Config;
use crate::gateway::{parse_amount, GatewayAdapter, RawIds};
use crate::types::{GatewayError, Payload};
use rust_decimal::Decimal;

/// Code 2Checkout is registered under
pub const CODE: &str = "2co";

/// 2Checkout adapter
#[derive(Debug, Clone)]
pub struct TwoCheckoutGateway {
    vendor_id: String,
}

impl TwoCheckoutGateway {
    pub fn new(vendor_id: impl Into<String>) -> Self {
        TwoCheckoutGateway {
            vendor_id: vendor_id.into(),
        }
    }

    /// Factory used by the gateway registry
    pub fn from_config(config: &Config) -> Box<dyn GatewayAdapter> {
        Box::new(TwoCheckoutGateway::new(
            config.gateways.twocheckout.vendor_id.clone(),
        ))
    }

    fn order_reference<'a>(payload: &'a Payload) -> Option<&'a str> {
        payload
            .get_non_empty("x_invoice_num")
            .or_else(|| payload.get_non_empty("cart_order_id"))
    }
}

impl GatewayAdapter for TwoCheckoutGateway {
    fn code(&self) -> &'static str {
        CODE
    }

    fn is_valid(&self, payload: &Payload) -> bool {
        !self.vendor_id.is_empty()
            && payload.get("sid") == Some(self.vendor_id.as_str())
            && Self::order_reference(payload).is_some()
    }

    fn precheck(&self, payload: &Payload) -> Result<RawIds, GatewayError> {
        Self::order_reference(payload)
            .map(RawIds::from_reference)
            .ok_or(GatewayError::MissingField {
                field: "x_invoice_num",
            })
    }

    fn is_refund(&self, _payload: &Payload) -> bool {
        false
    }

    fn is_payment(&self, payload: &Payload) -> bool {
        payload.get("credit_card_processed") == Some("Y")
    }

    fn is_subscription(&self, _payload: &Payload) -> bool {
        false
    }

    fn is_cancellation(&self, _payload: &Payload) -> bool {
        false
    }

    fn cost(&self, payload: &Payload) -> Decimal {
        parse_amount(payload.get("total"))
    }
}
