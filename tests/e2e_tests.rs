//! End-to-end integration tests
//!
//! These tests run whole deliveries through the webhook service against CSV
//! subscription tables. Fixture tests:
//! 1. Copy the tables from a fixture directory into a temporary data directory
//! 2. Read payload.txt as the webhook body
//! 3. Handle the delivery at a fixed time of receipt
//! 4. Compare the rewritten log_subscribed.csv with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - PayPal renewals, one-off payments, refunds and cancellations
//! - 2Checkout orders
//! - Payments that match no price
//!
//! The remaining tests cover rejected deliveries and the receipts outbox.

#[cfg(test)]
mod tests {
    use paid_subscriptions::config::{Config, ReceiptLevel};
    use paid_subscriptions::core::Outcome;
    use paid_subscriptions::gateway::TransactionKind;
    use paid_subscriptions::io::read_payload;
    use paid_subscriptions::service::{Response, WebhookService};
    use paid_subscriptions::types::{Payload, RequestContext, SubscriptionError};
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    const RECEIVED_AT: i64 = 1_700_000_000;
    const TABLES: [&str; 3] = ["subscriptions.csv", "members.csv", "log_subscribed.csv"];

    /// Copy a fixture's tables into a fresh data directory
    fn data_dir(fixture_name: &str) -> TempDir {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        let dir = tempdir().expect("Failed to create temp dir");
        for table in TABLES {
            fs::copy(fixture_dir.join(table), dir.path().join(table))
                .unwrap_or_else(|e| panic!("Failed to copy {}/{}: {}", fixture_name, table, e));
        }
        dir
    }

    fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = dir.to_path_buf();
        config.storage.outbox = Some(dir.join("outbox.jsonl"));
        config.paid.receipts = ReceiptLevel::All;
        config.paid.admin_emails = vec!["admin@example.com".to_string()];
        config.gateways.paypal.email = "pay@example.com".to_string();
        config.gateways.twocheckout.vendor_id = "901".to_string();
        config
    }

    fn handle(dir: &Path, payload: Payload) -> Response {
        WebhookService::new(config(dir))
            .expect("Failed to build service")
            .handle(&RequestContext::new(payload, RECEIVED_AT))
    }

    /// Lines with trailing whitespace and line endings removed
    fn normalize(content: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }

    fn outbox_kinds(dir: &Path) -> Vec<String> {
        let path = dir.join("outbox.jsonl");
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| {
                let entry: serde_json::Value = serde_json::from_str(line).unwrap();
                entry["kind"].as_str().unwrap().to_string()
            })
            .collect()
    }

    /// Run a fixture and compare the resulting log table with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if the delivery is not handled or the table differs from expected.csv
    #[rstest]
    #[case::paypal_flexible_renewal("paypal_flexible_renewal", TransactionKind::SubscriptionRenewal)]
    #[case::paypal_one_off_payment("paypal_one_off_payment", TransactionKind::Payment)]
    #[case::paypal_refund("paypal_refund", TransactionKind::Refund)]
    #[case::paypal_cancel_lapsed("paypal_cancel_lapsed", TransactionKind::Cancellation)]
    #[case::paypal_underpayment_ignored(
        "paypal_underpayment_ignored",
        TransactionKind::SubscriptionRenewal
    )]
    #[case::two_checkout_prepaid_order("two_checkout_prepaid_order", TransactionKind::Payment)]
    fn test_fixture(#[case] fixture_name: &str, #[case] kind: TransactionKind) {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        let dir = data_dir(fixture_name);
        let payload = read_payload(Some(fixture_dir.join("payload.txt").as_path()))
            .unwrap_or_else(|e| panic!("Failed to read payload: {}", e));

        let response = handle(dir.path(), payload);

        match response {
            Response::Handled(reconciliation) => assert_eq!(reconciliation.kind, kind),
            other => panic!("Fixture {} was not handled: {:?}", fixture_name, other),
        }

        let actual = fs::read_to_string(dir.path().join("log_subscribed.csv")).unwrap();
        let expected = fs::read_to_string(fixture_dir.join("expected.csv")).unwrap();
        assert_eq!(
            normalize(&actual),
            normalize(&expected),
            "\n\nFixture: {}\n",
            fixture_name
        );
    }

    #[test]
    fn test_new_subscription_receipt_is_queued() {
        let dir = data_dir("paypal_flexible_renewal");
        let payload = read_payload(Some(Path::new(
            "tests/fixtures/paypal_flexible_renewal/payload.txt",
        )))
        .unwrap();

        handle(dir.path(), payload);

        assert_eq!(outbox_kinds(dir.path()), vec!["subscription_new"]);
        let entry: serde_json::Value = serde_json::from_str(
            fs::read_to_string(dir.path().join("outbox.jsonl"))
                .unwrap()
                .lines()
                .next()
                .unwrap(),
        )
        .unwrap();
        let body = entry["body"].as_str().unwrap();
        assert!(body.contains("Subscription: Supporter"));
        assert!(body.contains("Price: $100.00"));
        assert!(body.contains("index.php?action=profile;u=42"));
    }

    #[test]
    fn test_corrupt_row_of_other_member_does_not_block_renewal() {
        let dir = data_dir("paypal_flexible_renewal");
        let logs_path = dir.path().join("log_subscribed.csv");
        let broken = "3,4,99,0,0,0,1,\"a:1:{i:0;s:3:\"\"old\"\";}\"";
        let mut logs = fs::read_to_string(&logs_path).unwrap();
        logs.push_str(broken);
        logs.push('\n');
        fs::write(&logs_path, logs).unwrap();
        let payload = read_payload(Some(Path::new(
            "tests/fixtures/paypal_flexible_renewal/payload.txt",
        )))
        .unwrap();

        let response = handle(dir.path(), payload);

        assert!(matches!(
            response,
            Response::Handled(ref r) if r.member_id == 42 && matches!(r.outcome, Outcome::Extended { .. })
        ));
        let content = fs::read_to_string(&logs_path).unwrap();
        assert_eq!(content.lines().last(), Some(broken));
    }

    #[test]
    fn test_underpayment_sends_nothing() {
        let dir = data_dir("paypal_underpayment_ignored");
        let payload = read_payload(Some(Path::new(
            "tests/fixtures/paypal_underpayment_ignored/payload.txt",
        )))
        .unwrap();

        let response = handle(dir.path(), payload);

        assert!(matches!(
            response,
            Response::Handled(ref r) if matches!(r.outcome, Outcome::PaymentIgnored(_))
        ));
        assert!(outbox_kinds(dir.path()).is_empty());
    }

    #[test]
    fn test_replayed_one_off_payment_is_rejected() {
        let dir = data_dir("paypal_one_off_payment");
        let body = Path::new("tests/fixtures/paypal_one_off_payment/payload.txt");

        let first = handle(dir.path(), read_payload(Some(body)).unwrap());
        let table_after_first = fs::read_to_string(dir.path().join("log_subscribed.csv")).unwrap();
        let second = handle(dir.path(), read_payload(Some(body)).unwrap());

        assert_eq!(first.exit_code(), 0);
        match second {
            Response::Rejected { ref error, .. } => {
                assert_eq!(*error, SubscriptionError::no_outstanding_payment(42, 4));
            }
            ref other => panic!("Expected rejection, got {:?}", other),
        }
        assert_eq!(second.exit_code(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("log_subscribed.csv")).unwrap(),
            table_after_first
        );
        assert_eq!(
            outbox_kinds(dir.path()),
            vec!["subscription_new", "subscription_error"]
        );
    }

    #[rstest]
    #[case::no_member_id("4", SubscriptionError::MissingMember)]
    #[case::unknown_member("4%2B7", SubscriptionError::member_not_found(7))]
    #[case::unknown_plan("9%2B42", SubscriptionError::subscription_not_found(42, 9))]
    fn test_precheck_rejections(#[case] item_number: &str, #[case] expected: SubscriptionError) {
        let dir = data_dir("paypal_one_off_payment");
        let body = format!(
            "txn_type=web_accept&payment_status=Completed&business=pay%40example.com&item_number={}&mc_gross=50.00&mc_currency=USD",
            item_number
        );

        let response = handle(dir.path(), Payload::from_form(body.as_bytes()));

        match response {
            Response::Rejected { error, report } => {
                assert_eq!(error, expected);
                assert!(report.contains("<br />business: pay@example.com"));
            }
            other => panic!("Expected rejection, got {:?}", other),
        }
        assert_eq!(outbox_kinds(dir.path()), vec!["subscription_error"]);
    }

    #[test]
    fn test_missing_log_row_is_rejected() {
        // Plan 3 exists but member 42 has no row for it in this fixture.
        let dir = data_dir("paypal_one_off_payment");
        let body = "txn_type=subscr_payment&payment_status=Completed&business=pay%40example.com&item_number=3%2B42&mc_gross=10.00&mc_currency=USD";

        let response = handle(dir.path(), Payload::from_form(body.as_bytes()));

        assert!(matches!(
            response,
            Response::Rejected {
                error: SubscriptionError::SubscriptionLogNotFound {
                    member_id: 42,
                    subscription_id: 3
                },
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_currency_is_rejected() {
        let dir = data_dir("paypal_one_off_payment");
        let body = "txn_type=web_accept&payment_status=Completed&business=pay%40example.com&item_number=4%2B42&mc_gross=50.00&mc_currency=EUR";

        let response = handle(dir.path(), Payload::from_form(body.as_bytes()));

        assert!(matches!(
            response,
            Response::Rejected {
                error: SubscriptionError::Gateway { gateway: "paypal", .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_gateway_is_rejected() {
        let dir = data_dir("paypal_one_off_payment");
        let body = "txn_type=web_accept&business=someone-else%40example.com";

        let response = handle(dir.path(), Payload::from_form(body.as_bytes()));

        assert!(matches!(
            response,
            Response::Rejected {
                error: SubscriptionError::UnknownGateway,
                ..
            }
        ));
    }

    #[test]
    fn test_informational_delivery_changes_nothing() {
        let dir = data_dir("paypal_one_off_payment");
        let before = fs::read_to_string(dir.path().join("log_subscribed.csv")).unwrap();
        let body = "txn_type=subscr_signup&business=pay%40example.com&item_number=4%2B42&mc_currency=USD";

        let response = handle(dir.path(), Payload::from_form(body.as_bytes()));

        assert!(matches!(
            response,
            Response::Handled(ref r) if r.outcome == Outcome::Ignored
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("log_subscribed.csv")).unwrap(),
            before
        );
    }
}
