//! Paid subscriptions webhook CLI
//!
//! Reconciles one payment gateway webhook delivery per invocation, CGI style.
//!
//! # Usage
//!
//! ```bash
//! subscriptions-webhook --config subscriptions.toml < ipn-body.txt
//! subscriptions-webhook --config subscriptions.toml --payload ipn-body.txt
//! subscriptions-webhook --payload stored-ipn.txt --received-at 1700000000
//! ```
//!
//! The request body is read from the payload file (or stdin), reconciled
//! against the subscription tables in the configured data directory, and any
//! receipts are written to the configured outbox. Logs go to stderr and are
//! filtered with `RUST_LOG` (default `info`).
//!
//! # Exit Codes
//!
//! - 0: Delivery handled, ignored, or empty
//! - 1: Delivery rejected, or the configuration or body could not be read

use paid_subscriptions::cli;
use paid_subscriptions::config::Config;
use paid_subscriptions::io::read_payload;
use paid_subscriptions::service::{Response, WebhookService, NO_DATA_MESSAGE};
use paid_subscriptions::types::{RequestContext, ServiceError};
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    match run(&args) {
        Ok(response) => {
            if response == Response::NoData {
                println!("{}", NO_DATA_MESSAGE);
            }
            if let Response::Handled(reconciliation) = &response {
                info!(
                    gateway = reconciliation.gateway,
                    kind = ?reconciliation.kind,
                    outcome = ?reconciliation.outcome,
                    "Delivery handled"
                );
            }
            process::exit(response.exit_code());
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

fn run(args: &cli::CliArgs) -> Result<Response, ServiceError> {
    let config = Config::from_file(&args.config)?;
    let service = WebhookService::new(config)?;

    let payload = read_payload(args.payload.as_deref()).map_err(|e| ServiceError::Input {
        message: e.to_string(),
    })?;
    let request = RequestContext::new(payload, args.received_at());

    Ok(service.handle(&request))
}
