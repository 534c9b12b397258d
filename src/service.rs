//! Webhook service
//!
//! Wires configuration, storage, gateways and notices together for a single
//! delivery, the way the forum's subscription endpoint handles one POST:
//!
//! 1. An empty body is answered with a "no data" message
//! 2. Nothing happens while paid subscriptions are disabled
//! 3. The gateway is resolved before the subscription tables are opened
//! 4. The engine reconciles the delivery; any error is reported
//!
//! # Example
//!
//! ```no_run
//! use paid_subscriptions::config::Config;
//! use paid_subscriptions::service::WebhookService;
//! use paid_subscriptions::types::{Payload, RequestContext};
//!
//! let config = Config::from_file("subscriptions.toml").unwrap();
//! let service = WebhookService::new(config).unwrap();
//! let request = RequestContext::new(Payload::from_form(b"txn_type=web_accept"), 1_700_000_000);
//! std::process::exit(service.handle(&request).exit_code());
//! ```

use crate::config::Config;
use crate::core::resolver::resolve_gateway;
use crate::core::{Reconciliation, ReconciliationEngine};
use crate::gateway::{GatewayAdapter, GatewayRegistry};
use crate::io::CsvTableStore;
use crate::notify::{LogNotifier, Notifier, OutboxNotifier};
use crate::report::ErrorReporter;
use crate::types::{ConfigError, RequestContext, SubscriptionError};
use tracing::{debug, info};

/// Answer for an empty request body
pub const NO_DATA_MESSAGE: &str = "No valid data was sent to the paid subscription handler.";

/// How a delivery was answered
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Empty request body
    NoData,
    /// Paid subscriptions are switched off
    Disabled,
    /// Delivery reconciled
    Handled(Reconciliation),
    /// Delivery abandoned; `report` is the logged error text
    Rejected {
        error: SubscriptionError,
        report: String,
    },
}

impl Response {
    /// Process exit status for this response
    pub fn exit_code(&self) -> i32 {
        match self {
            Response::Rejected { .. } => 1,
            _ => 0,
        }
    }
}

/// Handles one webhook delivery per instance
pub struct WebhookService {
    config: Config,
    gateways: Vec<Box<dyn GatewayAdapter>>,
}

impl WebhookService {
    /// Create a service with the bundled gateways
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownGateway` if an enabled gateway code is not bundled.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_registry(config, &GatewayRegistry::with_defaults())
    }

    /// Create a service with gateways from a custom registry
    pub fn with_registry(config: Config, registry: &GatewayRegistry) -> Result<Self, ConfigError> {
        let gateways = registry.build(&config)?;
        debug!(
            gateways = ?gateways.iter().map(|g| g.code()).collect::<Vec<_>>(),
            "Gateways configured"
        );
        Ok(WebhookService { config, gateways })
    }

    /// Handle a delivery
    pub fn handle(self, request: &RequestContext) -> Response {
        if request.payload().is_empty() {
            info!("Empty request body");
            return Response::NoData;
        }
        if !self.config.paid.enabled {
            debug!("Paid subscriptions disabled, delivery ignored");
            return Response::Disabled;
        }

        let WebhookService { config, gateways } = self;
        match reconcile(&config, gateways, request) {
            Ok(reconciliation) => Response::Handled(reconciliation),
            Err(error) => {
                let notifier = notifier_for(&config);
                let report =
                    ErrorReporter::new(&config.paid, notifier.as_ref()).report(&error, request);
                Response::Rejected { error, report }
            }
        }
    }
}

fn reconcile(
    config: &Config,
    gateways: Vec<Box<dyn GatewayAdapter>>,
    request: &RequestContext,
) -> Result<Reconciliation, SubscriptionError> {
    // Unknown deliveries must not touch storage.
    resolve_gateway(&gateways, request.payload())?;

    let store = CsvTableStore::open(&config.storage.data_dir)?;
    let mut engine =
        ReconciliationEngine::new(store, gateways, notifier_for(config), config.paid.clone());
    engine.process(request)
}

fn notifier_for(config: &Config) -> Box<dyn Notifier> {
    match &config.storage.outbox {
        Some(path) => Box::new(OutboxNotifier::new(path)),
        None => Box::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payload;
    use std::path::PathBuf;

    fn config() -> Config {
        let mut config = Config::default();
        config.storage.data_dir = PathBuf::from("/nonexistent/subscription-data");
        config.gateways.paypal.email = "pay@example.com".to_string();
        config
    }

    fn request(pairs: &[(&str, &str)]) -> RequestContext {
        RequestContext::new(Payload::from_pairs(pairs.iter().copied()), 1_700_000_000)
    }

    #[test]
    fn test_empty_body_is_no_data() {
        let response = WebhookService::new(config()).unwrap().handle(&request(&[]));

        assert_eq!(response, Response::NoData);
        assert_eq!(response.exit_code(), 0);
    }

    #[test]
    fn test_disabled_ignores_delivery() {
        let mut config = config();
        config.paid.enabled = false;

        let response = WebhookService::new(config)
            .unwrap()
            .handle(&request(&[("txn_type", "web_accept")]));

        assert_eq!(response, Response::Disabled);
    }

    #[test]
    fn test_unknown_gateway_rejected_without_opening_tables() {
        let response = WebhookService::new(config())
            .unwrap()
            .handle(&request(&[("foo", "bar")]));

        match response {
            Response::Rejected { ref error, ref report } => {
                assert_eq!(*error, SubscriptionError::UnknownGateway);
                assert!(report.ends_with("<br />foo: bar"));
            }
            other => panic!("Expected rejection, got {:?}", other),
        }
        assert_eq!(response.exit_code(), 1);
    }

    #[test]
    fn test_missing_tables_are_reported() {
        let response = WebhookService::new(config()).unwrap().handle(&request(&[
            ("txn_type", "web_accept"),
            ("business", "pay@example.com"),
            ("item_number", "4+42"),
        ]));

        assert!(matches!(
            response,
            Response::Rejected {
                error: SubscriptionError::Store(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unregistered_gateway_code_fails_construction() {
        let mut config = config();
        config.gateways.enabled = vec!["stripe".to_string()];

        let result = WebhookService::new(config);

        assert!(matches!(result, Err(ConfigError::UnknownGateway { .. })));
    }
}
