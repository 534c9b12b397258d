//! Error reporting
//!
//! Every terminal reconciliation error ends here. The administrators get the
//! bare message (when error receipts are enabled) and the error log gets the
//! message followed by a dump of the raw request, one `<br />key: value` per
//! field with both sides HTML-escaped.

use crate::config::{PaidConfig, ReceiptLevel};
use crate::notify::{NoticeBuilder, Notifier};
use crate::types::{RequestContext, SubscriptionError};
use tracing::error;

/// Reports terminal errors to administrators and the error log
pub struct ErrorReporter<'a> {
    settings: &'a PaidConfig,
    notifier: &'a dyn Notifier,
}

impl<'a> ErrorReporter<'a> {
    pub fn new(settings: &'a PaidConfig, notifier: &'a dyn Notifier) -> Self {
        ErrorReporter { settings, notifier }
    }

    /// Report an error for a request
    ///
    /// # Returns
    ///
    /// The logged text: the error message plus the request dump
    pub fn report(&self, err: &SubscriptionError, request: &RequestContext) -> String {
        let message = err.to_string();

        if self.settings.receipts >= ReceiptLevel::Errors {
            let notice = NoticeBuilder::new(self.settings).error(&message);
            self.notifier.send(&notice);
        }

        let text = format!("{}{}", message, dump_request(request));
        error!(received_at = request.received_at(), "{}", text);
        text
    }
}

/// Flatten the request fields into `<br />key: value` lines
fn dump_request(request: &RequestContext) -> String {
    request
        .payload()
        .iter()
        .map(|(key, value)| format!("<br />{}: {}", escape_html(key), escape_html(value)))
        .collect()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
