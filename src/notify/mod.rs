//! Administrator notices
//!
//! Errors, refunds and new subscriptions are reported to the forum's
//! administrators and to an extra notify list. Delivery is fire-and-forget:
//! a notifier logs its own failures and never reports them to the caller.
//!
//! # Components
//!
//! - `Notice` - A templated notice plus its recipients
//! - `outbox` - Notifier implementations (JSON-lines outbox, log-only, in-memory)

pub mod outbox;

pub use outbox::{LogNotifier, MemoryNotifier, OutboxNotifier};

use crate::config::PaidConfig;
use crate::types::{Member, MemberId, Timestamp};
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// Delivers notices
pub trait Notifier {
    /// Send a notice; failures are logged by the implementation
    fn send(&self, notice: &Notice);
}

/// Which template a notice uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    SubscriptionError,
    SubscriptionRefund,
    SubscriptionNew,
}

impl NoticeKind {
    fn subject(self) -> &'static str {
        match self {
            NoticeKind::SubscriptionError => "Paid subscription error",
            NoticeKind::SubscriptionRefund => "Paid subscription refunded",
            NoticeKind::SubscriptionNew => "New paid subscription",
        }
    }

    fn body(self) -> &'static str {
        match self {
            NoticeKind::SubscriptionError => {
                "An error occurred while processing a paid subscription payment:\n\n{ERROR}"
            }
            NoticeKind::SubscriptionRefund => {
                "A paid subscription has been refunded.\n\n\
                 Subscription: {NAME}\n\
                 Member: {REFUNDNAME} ({REFUNDUSER})\n\
                 Date: {DATE}\n\n\
                 Profile: {PROFILELINK}"
            }
            NoticeKind::SubscriptionNew => {
                "A member has taken out a paid subscription.\n\n\
                 Subscription: {NAME}\n\
                 Member: {SUBNAME} ({SUBUSER})\n\
                 Email: {SUBEMAIL}\n\
                 Price: {PRICE}\n\
                 Date: {DATE}\n\n\
                 Profile: {PROFILELINK}"
            }
        }
    }
}

/// Someone who receives notices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Member ID, 0 for addresses from the notify list
    pub id: MemberId,
    pub name: String,
    pub email: String,
}

/// A notice ready to send
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Placeholder → value, in template order
    pub replacements: Vec<(&'static str, String)>,
    pub recipients: Vec<Recipient>,
}

impl Notice {
    /// Look up a replacement value
    pub fn replacement(&self, key: &str) -> Option<&str> {
        self.replacements
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn subject(&self) -> &'static str {
        self.kind.subject()
    }

    /// Body with every `{KEY}` placeholder filled in
    pub fn render_body(&self) -> String {
        self.replacements
            .iter()
            .fold(self.kind.body().to_string(), |body, (key, value)| {
                body.replace(&format!("{{{}}}", key), value)
            })
    }
}

/// Builds notices from paid-subscription settings
///
/// Recipients are the configured administrators followed by the notify list.
#[derive(Debug, Clone)]
pub struct NoticeBuilder<'a> {
    settings: &'a PaidConfig,
}

impl<'a> NoticeBuilder<'a> {
    pub fn new(settings: &'a PaidConfig) -> Self {
        NoticeBuilder { settings }
    }

    /// Everyone who receives notices
    pub fn recipients(&self) -> Vec<Recipient> {
        let admins = self.settings.admin_emails.iter().map(|email| Recipient {
            id: 0,
            name: "Administrator".to_string(),
            email: email.clone(),
        });
        let notify = self.settings.notify_emails.iter().map(|email| Recipient {
            id: 0,
            name: "Member".to_string(),
            email: email.clone(),
        });
        admins.chain(notify).collect()
    }

    pub fn error(&self, message: &str) -> Notice {
        Notice {
            kind: NoticeKind::SubscriptionError,
            replacements: vec![("ERROR", message.to_string())],
            recipients: self.recipients(),
        }
    }

    pub fn refund(&self, plan_name: &str, member: &Member, now: Timestamp) -> Notice {
        Notice {
            kind: NoticeKind::SubscriptionRefund,
            replacements: vec![
                ("NAME", plan_name.to_string()),
                ("REFUNDNAME", member.member_name.clone()),
                ("REFUNDUSER", member.real_name.clone()),
                ("PROFILELINK", self.profile_link(member.id)),
                ("DATE", format_date(now)),
            ],
            recipients: self.recipients(),
        }
    }

    pub fn new_subscription(
        &self,
        plan_name: &str,
        member: &Member,
        paid: Decimal,
        now: Timestamp,
    ) -> Notice {
        Notice {
            kind: NoticeKind::SubscriptionNew,
            replacements: vec![
                ("NAME", plan_name.to_string()),
                ("SUBNAME", member.member_name.clone()),
                ("SUBUSER", member.real_name.clone()),
                ("SUBEMAIL", member.email.clone()),
                ("PRICE", self.format_price(paid)),
                ("PROFILELINK", self.profile_link(member.id)),
                ("DATE", format_date(now)),
            ],
            recipients: self.recipients(),
        }
    }

    fn profile_link(&self, member_id: MemberId) -> String {
        format!("{}?action=profile;u={}", self.settings.board_url, member_id)
    }

    fn format_price(&self, amount: Decimal) -> String {
        self.settings
            .currency_format
            .replace("{amount}", &format!("{:.2}", amount.round_dp(2)))
    }
}

/// Human-readable UTC date for notices
pub fn format_date(timestamp: Timestamp) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%B %d, %Y, %I:%M:%S %p").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
