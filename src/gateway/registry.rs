//! Gateway registry
//!
//! Maps a gateway code to the factory that builds its adapter. The configured
//! list of codes is resolved against the registry once at startup, so an
//! unknown code is a configuration error rather than a failed delivery.

use crate::config::Config;
use crate::gateway::{paypal, two_checkout, GatewayAdapter};
use crate::types::ConfigError;

/// Builds an adapter from the service configuration
pub type GatewayFactory = fn(&Config) -> Box<dyn GatewayAdapter>;

/// Code → factory lookup table
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    factories: Vec<(&'static str, GatewayFactory)>,
}

impl GatewayRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled PayPal and 2Checkout adapters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(paypal::CODE, paypal::PaypalGateway::from_config);
        registry.register(two_checkout::CODE, two_checkout::TwoCheckoutGateway::from_config);
        registry
    }

    /// Register a factory, replacing any previous one under the same code
    pub fn register(&mut self, code: &'static str, factory: GatewayFactory) {
        match self.factories.iter_mut().find(|(c, _)| *c == code) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((code, factory)),
        }
    }

    /// Factory registered under a code
    pub fn get(&self, code: &str) -> Option<GatewayFactory> {
        self.factories
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, factory)| *factory)
    }

    /// Build the configured adapters in configuration order
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownGateway` for the first code with no factory.
    pub fn build(&self, config: &Config) -> Result<Vec<Box<dyn GatewayAdapter>>, ConfigError> {
        config
            .gateways
            .enabled
            .iter()
            .map(|code| {
                self.get(code)
                    .map(|factory| factory(config))
                    .ok_or_else(|| ConfigError::UnknownGateway { code: code.clone() })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_in_configured_order() {
        let mut config = Config::default();
        config.gateways.enabled = vec!["2co".to_string(), "paypal".to_string()];

        let adapters = GatewayRegistry::with_defaults().build(&config).unwrap();
        let codes: Vec<_> = adapters.iter().map(|a| a.code()).collect();

        assert_eq!(codes, vec!["2co", "paypal"]);
    }

    #[test]
    fn test_unknown_code_is_config_error() {
        let mut config = Config::default();
        config.gateways.enabled = vec!["paypal".to_string(), "worldpay".to_string()];

        let result = GatewayRegistry::with_defaults().build(&config);

        assert!(matches!(
            result,
            Err(ConfigError::UnknownGateway { code }) if code == "worldpay"
        ));
    }

    #[test]
    fn test_register_replaces_existing_code() {
        fn only_2co(config: &Config) -> Box<dyn GatewayAdapter> {
            two_checkout::TwoCheckoutGateway::from_config(config)
        }

        let mut registry = GatewayRegistry::with_defaults();
        registry.register("paypal", only_2co);

        let mut config = Config::default();
        config.gateways.enabled = vec!["paypal".to_string()];
        let adapters = registry.build(&config).unwrap();

        assert_eq!(adapters[0].code(), "2co");
        assert!(GatewayRegistry::new().get("paypal").is_none());
    }
}
