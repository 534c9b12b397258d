//! Error types for the subscription webhook processor
//!
//! This module defines every error that can stop a webhook delivery from being
//! reconciled, plus the infrastructure errors raised by storage, gateway
//! adapters and configuration loading.
//!
//! # Error Categories
//!
//! - **Reconciliation Errors** (`SubscriptionError`): terminal for the current
//!   delivery, always routed through the error reporter
//! - **Storage Errors** (`StoreError`): table files missing, unreadable or corrupt
//! - **Gateway Errors** (`GatewayError`): an adapter accepted the request shape but
//!   rejected its contents during pre-check
//! - **Configuration Errors** (`ConfigError`): the service cannot start

use super::{MemberId, SubscriptionId};
use thiserror::Error;

/// Terminal reconciliation error
///
/// Every variant aborts processing of the current webhook delivery. There is no
/// retry: the payment provider's own redelivery policy is the only recovery path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubscriptionError {
    /// No configured gateway adapter recognised the request
    #[error("Unknown paid subscriptions transaction type")]
    UnknownGateway,

    /// The gateway could not supply a member ID
    #[error("Paid subscription handler could not recover a member ID")]
    MissingMember,

    /// The member referenced by the gateway does not exist
    #[error("Paid subscription handler could not find member with ID {member_id}")]
    MemberNotFound {
        /// Member ID reported by the gateway
        member_id: MemberId,
    },

    /// The subscription plan referenced by the gateway does not exist
    #[error(
        "Paid subscription handler could not find subscription for member ID {member_id}, subscription ID {subscription_id}"
    )]
    SubscriptionNotFound {
        /// Member ID reported by the gateway
        member_id: MemberId,
        /// Subscription ID reported by the gateway
        subscription_id: SubscriptionId,
    },

    /// No log row exists for the (member, subscription) pair
    #[error(
        "Paid subscription handler could not find subscription log entry for member ID {member_id}, subscription ID {subscription_id}"
    )]
    SubscriptionLogNotFound {
        /// Member ID reported by the gateway
        member_id: MemberId,
        /// Subscription ID reported by the gateway
        subscription_id: SubscriptionId,
    },

    /// A one-off payment arrived but nothing was pending for it
    #[error(
        "Could not find outstanding payment entry for member ID {member_id}, subscription ID {subscription_id}"
    )]
    NoOutstandingPayment {
        /// Member ID reported by the gateway
        member_id: MemberId,
        /// Subscription ID reported by the gateway
        subscription_id: SubscriptionId,
    },

    /// The matched gateway rejected the request during pre-check
    #[error("Gateway '{gateway}' rejected the request: {source}")]
    Gateway {
        /// Code of the gateway that rejected the request
        gateway: &'static str,
        /// Reason reported by the adapter
        #[source]
        source: GatewayError,
    },

    /// Reading or writing subscription state failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SubscriptionError {
    /// Create a MemberNotFound error
    pub fn member_not_found(member_id: MemberId) -> Self {
        SubscriptionError::MemberNotFound { member_id }
    }

    /// Create a SubscriptionNotFound error
    pub fn subscription_not_found(member_id: MemberId, subscription_id: SubscriptionId) -> Self {
        SubscriptionError::SubscriptionNotFound {
            member_id,
            subscription_id,
        }
    }

    /// Create a SubscriptionLogNotFound error
    pub fn subscription_log_not_found(
        member_id: MemberId,
        subscription_id: SubscriptionId,
    ) -> Self {
        SubscriptionError::SubscriptionLogNotFound {
            member_id,
            subscription_id,
        }
    }

    /// Create a NoOutstandingPayment error
    pub fn no_outstanding_payment(member_id: MemberId, subscription_id: SubscriptionId) -> Self {
        SubscriptionError::NoOutstandingPayment {
            member_id,
            subscription_id,
        }
    }

    /// Wrap an adapter rejection with the gateway code
    pub fn gateway(gateway: &'static str, source: GatewayError) -> Self {
        SubscriptionError::Gateway { gateway, source }
    }
}

/// Storage error
///
/// I/O and CSV failures are flattened into messages so the error stays `Clone`
/// and comparable in tests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A table file could not be opened, read or written
    #[error("I/O error on '{path}': {message}")]
    Io {
        /// Path of the table file
        path: String,
        /// Description of the I/O error
        message: String,
    },

    /// A table file is not valid CSV for its row type
    #[error("CSV error in '{path}'{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Csv {
        /// Path of the table file
        path: String,
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parse error
        message: String,
    },

    /// A serialized column could not be decoded
    #[error("Corrupt {column} column in {table} row {row_id}: {message}")]
    CorruptColumn {
        /// Table name
        table: &'static str,
        /// Primary key of the offending row
        row_id: u32,
        /// Column name
        column: &'static str,
        /// Decoder message
        message: String,
    },

    /// A row to update does not exist
    #[error("{table} row {row_id} does not exist")]
    MissingRow {
        /// Table name
        table: &'static str,
        /// Primary key that was not found
        row_id: u32,
    },
}

impl StoreError {
    /// Create an Io error for a path
    pub fn io(path: &std::path::Path, error: &std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    /// Create a Csv error for a path, keeping the line number when csv reports one
    pub fn csv(path: &std::path::Path, error: &csv::Error) -> Self {
        StoreError::Csv {
            path: path.display().to_string(),
            line: error.position().map(|pos| pos.line()),
            message: error.to_string(),
        }
    }

    /// Create a CorruptColumn error
    pub fn corrupt_column(
        table: &'static str,
        row_id: u32,
        column: &'static str,
        message: impl Into<String>,
    ) -> Self {
        StoreError::CorruptColumn {
            table,
            row_id,
            column,
            message: message.into(),
        }
    }
}

/// A notice could not be queued
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotifyError {
    /// The notice could not be encoded as an outbox line
    #[error("Failed to encode notice: {message}")]
    Encode {
        /// Encoder message
        message: String,
    },

    /// The outbox file could not be opened or written
    #[error("I/O error on outbox '{path}': {message}")]
    Io {
        /// Path of the outbox file
        path: String,
        /// Description of the I/O error
        message: String,
    },
}

impl NotifyError {
    /// Create an Io error for the outbox path
    pub fn io(path: &std::path::Path, error: &std::io::Error) -> Self {
        NotifyError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }
}

/// Rejection raised by a gateway adapter's pre-check
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// A field the adapter needs is absent
    #[error("missing field '{field}'")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// The payment currency differs from the configured one
    #[error("currency mismatch: expected '{expected}', received '{received}'")]
    CurrencyMismatch {
        /// Configured currency code
        expected: String,
        /// Currency code reported by the provider
        received: String,
    },
}

/// Configuration error, fatal at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config '{path}': {message}")]
    Io {
        /// Path of the configuration file
        path: String,
        /// Description of the I/O error
        message: String,
    },

    /// The configuration file is not valid TOML for the expected schema
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parser message
        message: String,
    },

    /// A gateway code listed in the configuration has no registered factory
    #[error("No payment gateway registered under code '{code}'")]
    UnknownGateway {
        /// Gateway code from the configuration
        code: String,
    },

    /// A value is present but unusable
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What is wrong
        message: String,
    },
}

/// Failure before a delivery reaches the reconciler
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request body could not be read
    #[error("Failed to read request body: {message}")]
    Input {
        /// Description of the I/O error
        message: String,
    },
}
