//! Notifier implementations
//!
//! - `OutboxNotifier` appends each rendered notice as one JSON line to a file
//!   that the forum's mail queue picks up
//! - `LogNotifier` only logs notices
//! - `MemoryNotifier` keeps notices in memory for inspection

use crate::notify::{Notice, NoticeKind, Notifier, Recipient};
use crate::types::NotifyError;
use serde::Serialize;
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn};

/// Outbox line format
#[derive(Debug, Serialize)]
struct OutboxEntry<'a> {
    kind: NoticeKind,
    subject: &'a str,
    body: String,
    recipients: &'a [Recipient],
}

/// Appends rendered notices to a JSON-lines outbox file
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        OutboxNotifier { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one notice as a JSON line
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Io` if the outbox cannot be opened or written.
    fn append(&self, notice: &Notice) -> Result<(), NotifyError> {
        let entry = OutboxEntry {
            kind: notice.kind,
            subject: notice.subject(),
            body: notice.render_body(),
            recipients: &notice.recipients,
        };
        let mut line = serde_json::to_string(&entry).map_err(|e| NotifyError::Encode {
            message: e.to_string(),
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| NotifyError::io(&self.path, &e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| NotifyError::io(&self.path, &e))
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, notice: &Notice) {
        if notice.recipients.is_empty() {
            warn!(kind = ?notice.kind, "Notice has no recipients, not queued");
            return;
        }

        match self.append(notice) {
            Ok(()) => info!(
                kind = ?notice.kind,
                recipients = notice.recipients.len(),
                outbox = %self.path.display(),
                "Notice queued"
            ),
            Err(e) => warn!(
                kind = ?notice.kind,
                outbox = %self.path.display(),
                error = %e,
                "Failed to queue notice"
            ),
        }
    }
}

/// Logs notices without delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notice: &Notice) {
        info!(
            kind = ?notice.kind,
            recipients = notice.recipients.len(),
            subject = notice.subject(),
            "Notice not delivered (no outbox configured)"
        );
    }
}

/// Collects notices in memory
///
/// Clones share the same list, so a test can keep one handle and give the
/// other to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Rc<RefCell<Vec<Notice>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub fn sent(&self) -> Vec<Notice> {
        self.sent.borrow().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notice: &Notice) {
        self.sent.borrow_mut().push(notice.clone());
    }
}
