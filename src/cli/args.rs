use crate::types::Timestamp;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

/// Reconcile one payment gateway webhook delivery against paid subscriptions
#[derive(Parser, Debug)]
#[command(name = "subscriptions-webhook")]
#[command(
    about = "Reconcile a payment gateway webhook against paid subscriptions",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        long = "config",
        value_name = "FILE",
        default_value = "subscriptions.toml",
        help = "Path to the TOML configuration file"
    )]
    pub config: PathBuf,

    /// Webhook body file path; stdin when omitted
    #[arg(
        long = "payload",
        value_name = "FILE",
        help = "File holding the form-encoded webhook body (default: read stdin)"
    )]
    pub payload: Option<PathBuf>,

    /// Time of receipt override, for replaying stored deliveries
    #[arg(
        long = "received-at",
        value_name = "UNIX_SECONDS",
        allow_negative_numbers = true,
        help = "Treat the delivery as received at this unix timestamp (default: now)"
    )]
    pub received_at: Option<Timestamp>,
}

impl CliArgs {
    /// Time of receipt: the override if given, otherwise the current time
    pub fn received_at(&self) -> Timestamp {
        self.received_at.unwrap_or_else(|| Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::defaults(&["program"], "subscriptions.toml", None)]
    #[case::custom_config(&["program", "--config", "/etc/paid.toml"], "/etc/paid.toml", None)]
    #[case::payload_file(
        &["program", "--payload", "ipn.txt"],
        "subscriptions.toml",
        Some("ipn.txt")
    )]
    fn test_path_options(
        #[case] args: &[&str],
        #[case] config: &str,
        #[case] payload: Option<&str>,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.config, PathBuf::from(config));
        assert_eq!(parsed.payload, payload.map(PathBuf::from));
    }

    #[rstest]
    #[case::override_given(&["program", "--received-at", "1700000000"], 1_700_000_000)]
    #[case::negative(&["program", "--received-at", "-5"], -5)]
    fn test_received_at_override(#[case] args: &[&str], #[case] expected: Timestamp) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.received_at(), expected);
    }

    #[test]
    fn test_received_at_defaults_to_now() {
        let before = Utc::now().timestamp();
        let parsed = CliArgs::try_parse_from(["program"]).unwrap();
        let received_at = parsed.received_at();
        assert!(received_at >= before && received_at <= Utc::now().timestamp());
    }

    // Error handling tests
    #[rstest]
    #[case::bad_timestamp(&["program", "--received-at", "yesterday"])]
    #[case::unknown_flag(&["program", "--gateway", "paypal"])]
    #[case::positional(&["program", "ipn.txt"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }
}
