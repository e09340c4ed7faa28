//! Pending entry model.

use serde::Serialize;

use crate::folder::FolderEntry;
use crate::ids::MessageId;

/// A folder entry waiting for one recipient address to be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEntry {
    /// The entry to place in the recipient's Inbox.
    pub entry: FolderEntry,
    /// Normalised recipient address not yet resolvable to an account.
    pub recipient: String,
}

impl PendingEntry {
    /// Creates a pending entry.
    #[must_use]
    pub fn new(entry: FolderEntry, recipient: impl Into<String>) -> Self {
        Self {
            entry,
            recipient: recipient.into(),
        }
    }

    /// Queue key: one entry per (message, recipient).
    #[must_use]
    pub fn key(&self) -> (MessageId, String) {
        (self.entry.message_id, self.recipient.clone())
    }
}
