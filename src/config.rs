//! Configuration for the webhook service
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [paid]
//! enabled = true
//! receipts = "all"              # off | errors | all
//! admin_emails = ["admin@example.com"]
//! notify_emails = "billing@example.com,owner@example.com"
//! currency_code = "usd"
//! currency_format = "${amount}"
//! board_url = "https://forum.example.com/index.php"
//!
//! [storage]
//! data_dir = "./data"
//! outbox = "./data/outbox.jsonl"
//!
//! [gateways]
//! enabled = ["paypal", "2co"]
//!
//! [gateways.paypal]
//! email = "payments@example.com"
//!
//! [gateways.twocheckout]
//! vendor_id = "1234567"
//! ```
//!
//! Every section and key is optional; missing values fall back to `Default`.

use crate::types::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paid: PaidConfig,
    pub storage: StorageConfig,
    pub gateways: GatewaysConfig,
}

/// Which administrator notices are emailed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptLevel {
    /// Nothing is emailed
    Off,
    /// Only reconciliation errors are emailed
    #[default]
    Errors,
    /// Errors, refunds and new subscriptions are emailed
    All,
}

/// Paid subscription settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaidConfig {
    /// When false, deliveries are accepted and ignored
    pub enabled: bool,
    pub receipts: ReceiptLevel,
    /// Forum administrators who receive notices
    pub admin_emails: Vec<String>,
    /// Extra addresses that receive notices, as a list or a comma-separated string
    #[serde(deserialize_with = "comma_list")]
    pub notify_emails: Vec<String>,
    /// Expected payment currency, compared case-insensitively
    pub currency_code: String,
    /// Price format for receipts; `{amount}` is replaced by the amount to two places
    pub currency_format: String,
    /// Forum script URL used to build profile links
    pub board_url: String,
}

impl Default for PaidConfig {
    fn default() -> Self {
        PaidConfig {
            enabled: true,
            receipts: ReceiptLevel::default(),
            admin_emails: Vec::new(),
            notify_emails: Vec::new(),
            currency_code: "usd".to_string(),
            currency_format: "${amount}".to_string(),
            board_url: "index.php".to_string(),
        }
    }
}

/// Where subscription state and outbound notices live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the CSV tables
    pub data_dir: PathBuf,
    /// JSON-lines file that receives rendered notices; notices are only logged when unset
    pub outbox: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("./data"),
            outbox: None,
        }
    }
}

/// Gateway selection and per-gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaysConfig {
    /// Gateway codes, in the order they are asked to recognise a request
    pub enabled: Vec<String>,
    pub paypal: PaypalConfig,
    pub twocheckout: TwoCheckoutConfig,
}

impl Default for GatewaysConfig {
    fn default() -> Self {
        GatewaysConfig {
            enabled: vec!["paypal".to_string(), "2co".to_string()],
            paypal: PaypalConfig::default(),
            twocheckout: TwoCheckoutConfig::default(),
        }
    }
}

/// PayPal IPN settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaypalConfig {
    /// Primary receiver address; PayPal is disabled while empty
    pub email: String,
    /// Other receiver addresses accepted as the business
    #[serde(deserialize_with = "comma_list")]
    pub additional_emails: Vec<String>,
}

/// 2Checkout settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoCheckoutConfig {
    /// Vendor account number; 2Checkout is disabled while empty
    pub vendor_id: String,
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, `ConfigError::Parse`
    /// if it is not valid TOML for this schema, and `ConfigError::Invalid` if
    /// validation fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.data_dir must not be empty".to_string(),
            });
        }
        if self.gateways.enabled.is_empty() {
            return Err(ConfigError::Invalid {
                message: "gateways.enabled must list at least one gateway".to_string(),
            });
        }
        if !self.paid.currency_format.contains("{amount}") {
            return Err(ConfigError::Invalid {
                message: "paid.currency_format must contain {amount}".to_string(),
            });
        }
        Ok(())
    }
}

/// Accept either a TOML array or a comma-separated string
fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        String(String),
    }

    let items = match ListOrString::deserialize(deserializer)? {
        ListOrString::List(items) => items,
        ListOrString::String(joined) => joined.split(',').map(str::to_string).collect(),
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.paid.enabled);
        assert_eq!(config.paid.receipts, ReceiptLevel::Errors);
        assert_eq!(config.gateways.enabled, vec!["paypal", "2co"]);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml(
            r#"
            [paid]
            enabled = false
            receipts = "all"
            admin_emails = ["admin@example.com"]
            notify_emails = "a@example.com, b@example.com,"
            currency_code = "eur"
            currency_format = "{amount} EUR"
            board_url = "https://forum.example.com/index.php"

            [storage]
            data_dir = "/var/lib/forum"
            outbox = "/var/lib/forum/outbox.jsonl"

            [gateways]
            enabled = ["2co"]

            [gateways.paypal]
            email = "pay@example.com"
            additional_emails = ["alt@example.com"]

            [gateways.twocheckout]
            vendor_id = "901"
            "#,
        )
        .unwrap();

        assert!(!config.paid.enabled);
        assert_eq!(config.paid.receipts, ReceiptLevel::All);
        assert_eq!(
            config.paid.notify_emails,
            vec!["a@example.com", "b@example.com"]
        );
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/forum"));
        assert_eq!(
            config.storage.outbox,
            Some(PathBuf::from("/var/lib/forum/outbox.jsonl"))
        );
        assert_eq!(config.gateways.enabled, vec!["2co"]);
        assert_eq!(config.gateways.paypal.additional_emails, vec!["alt@example.com"]);
        assert_eq!(config.gateways.twocheckout.vendor_id, "901");
    }

    #[rstest]
    #[case::off("off", ReceiptLevel::Off)]
    #[case::errors("errors", ReceiptLevel::Errors)]
    #[case::all("all", ReceiptLevel::All)]
    fn test_receipt_levels(#[case] value: &str, #[case] expected: ReceiptLevel) {
        let config = Config::from_toml(&format!("[paid]\nreceipts = \"{}\"", value)).unwrap();
        assert_eq!(config.paid.receipts, expected);
    }

    #[test]
    fn test_receipt_levels_are_ordered() {
        assert!(ReceiptLevel::Off < ReceiptLevel::Errors);
        assert!(ReceiptLevel::Errors < ReceiptLevel::All);
    }

    #[rstest]
    #[case::bad_toml("[paid\nenabled = true")]
    #[case::bad_level("[paid]\nreceipts = \"sometimes\"")]
    fn test_parse_errors(#[case] content: &str) {
        assert!(matches!(
            Config::from_toml(content),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[rstest]
    #[case::no_gateways("[gateways]\nenabled = []")]
    #[case::empty_data_dir("[storage]\ndata_dir = \"\"")]
    #[case::format_without_amount("[paid]\ncurrency_format = \"$\"")]
    fn test_validation_errors(#[case] content: &str) {
        assert!(matches!(
            Config::from_toml(content),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/paid.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
