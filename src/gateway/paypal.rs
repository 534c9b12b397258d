//! PayPal Instant Payment Notification adapter
//!
//! PayPal posts IPN messages with `txn_type`/`payment_status` describing the
//! event and `item_number` carrying the `<subscription>+<member>` reference the
//! forum put on the checkout button.

use crate::config::Config;
use crate::core::period;
use crate::core::traits::SubscriptionStore;
use crate::gateway::{parse_amount, GatewayAdapter, RawIds};
use crate::types::{
    GatewayError, MemberId, Payload, StoreError, SubscriptionId, SubscriptionLog, Timestamp,
};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Code PayPal is registered under
pub const CODE: &str = "paypal";

/// PayPal IPN adapter
#[derive(Debug, Clone)]
pub struct PaypalGateway {
    receiver: String,
    additional_receivers: Vec<String>,
    currency: String,
}

impl PaypalGateway {
    pub fn new(
        receiver: impl Into<String>,
        additional_receivers: Vec<String>,
        currency: impl Into<String>,
    ) -> Self {
        PaypalGateway {
            receiver: receiver.into(),
            additional_receivers,
            currency: currency.into(),
        }
    }

    /// Factory used by the gateway registry
    pub fn from_config(config: &Config) -> Box<dyn GatewayAdapter> {
        Box::new(PaypalGateway::new(
            config.gateways.paypal.email.clone(),
            config.gateways.paypal.additional_emails.clone(),
            config.paid.currency_code.clone(),
        ))
    }

    fn business<'a>(&self, payload: &'a Payload) -> Option<&'a str> {
        payload
            .get("business")
            .or_else(|| payload.get("receiver_email"))
    }

    fn is_completed(payload: &Payload) -> bool {
        payload.get("payment_status") == Some("Completed")
    }
}

impl GatewayAdapter for PaypalGateway {
    fn code(&self) -> &'static str {
        CODE
    }

    fn is_valid(&self, payload: &Payload) -> bool {
        if self.receiver.is_empty() {
            return false;
        }
        if !payload.contains("txn_type") && !payload.contains("payment_status") {
            return false;
        }

        match self.business(payload) {
            Some(business) => {
                business == self.receiver
                    || self.additional_receivers.iter().any(|r| r == business)
            }
            None => false,
        }
    }

    fn precheck(&self, payload: &Payload) -> Result<RawIds, GatewayError> {
        let reference = payload
            .get_non_empty("item_number")
            .ok_or(GatewayError::MissingField {
                field: "item_number",
            })?;

        if !self.currency.is_empty() {
            let received = payload.get("mc_currency").unwrap_or_default();
            if !received.eq_ignore_ascii_case(&self.currency) {
                return Err(GatewayError::CurrencyMismatch {
                    expected: self.currency.clone(),
                    received: received.to_string(),
                });
            }
        }

        Ok(RawIds::from_reference(reference))
    }

    fn is_refund(&self, payload: &Payload) -> bool {
        matches!(
            payload.get("payment_status"),
            Some("Refunded") | Some("Reversed")
        ) || (payload.get("txn_type") == Some("web_accept")
            && payload.get("reason_code") == Some("refund"))
    }

    fn is_payment(&self, payload: &Payload) -> bool {
        payload.get("txn_type") == Some("web_accept") && Self::is_completed(payload)
    }

    fn is_subscription(&self, payload: &Payload) -> bool {
        payload
            .get("txn_type")
            .is_some_and(|t| t.starts_with("subscr_payment"))
            && Self::is_completed(payload)
    }

    fn is_cancellation(&self, payload: &Payload) -> bool {
        payload.get("txn_type").is_some_and(|t| {
            t.starts_with("subscr_cancel")
                || t == "recurring_payment_profile_cancel"
                || t == "recurring_payment_suspended_due_to_max_failed_payment"
        })
    }

    fn cost(&self, payload: &Payload) -> Decimal {
        parse_amount(payload.get("tax")) + parse_amount(payload.get("mc_gross"))
    }

    /// A cancelled PayPal subscription keeps running to the end of the paid
    /// period; only a row whose period already lapsed is deactivated.
    fn process_cancellation(
        &self,
        store: &mut dyn SubscriptionStore,
        subscription_id: SubscriptionId,
        member_id: MemberId,
        log: &SubscriptionLog,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut log = log.clone();
        if period::lapse_if_expired(&mut log, now) {
            store.save_subscription_log(&log)?;
            info!(subscription_id, member_id, "Lapsed subscription deactivated on cancellation");
        } else {
            debug!(
                subscription_id,
                member_id,
                end_time = log.end_time,
                "Cancelled subscription runs to the end of its period"
            );
        }
        Ok(())
    }
}
