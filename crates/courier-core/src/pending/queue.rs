//! Shared pending-delivery queue.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::model::PendingEntry;
use crate::ids::MessageId;
use crate::{Error, Result};

/// Pending entries keyed by `(message id, recipient)`.
///
/// Obtained through [`PendingQueue::lock`]; holding the guard while calling
/// into the Folder Store is how dispatch and resolution keep a single lock
/// order (queue first, folders second).
#[derive(Debug, Default)]
pub struct PendingSet {
    entries: BTreeMap<(MessageId, String), PendingEntry>,
}

impl PendingSet {
    /// Adds an entry, replacing any entry with the same key.
    pub fn enqueue(&mut self, pending: PendingEntry) {
        debug!(
            "Queued message {} for unregistered {}",
            pending.entry.message_id, pending.recipient
        );
        self.entries.insert(pending.key(), pending);
    }

    /// Removes the entry for one (message, recipient) pair.
    pub fn delete(&mut self, message: MessageId, recipient: &str) -> Option<PendingEntry> {
        self.entries.remove(&(message, recipient.to_string()))
    }

    /// Every queued entry, ordered by message id then recipient.
    #[must_use]
    pub fn list_all(&self) -> Vec<PendingEntry> {
        self.entries.values().cloned().collect()
    }

    /// Removes and returns every entry addressed to `recipient`.
    pub fn take_for_recipient(&mut self, recipient: &str) -> Vec<PendingEntry> {
        let keys: Vec<_> = self
            .entries
            .keys()
            .filter(|(_, r)| r == recipient)
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .collect()
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The process-wide pending queue, behind a single mutex.
#[derive(Debug, Default)]
pub struct PendingQueue {
    inner: Mutex<PendingSet>,
}

impl PendingQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn lock(&self) -> Result<MutexGuard<'_, PendingSet>> {
        self.inner.lock().map_err(|_| Error::poisoned("pending queue"))
    }

    /// Adds an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn enqueue(&self, pending: PendingEntry) -> Result<()> {
        self.lock()?.enqueue(pending);
        Ok(())
    }

    /// Removes the entry for one (message, recipient) pair.
    ///
    /// # Errors
    ///
    /// Returns `MessageNotFound` if no such entry is queued.
    pub fn delete(&self, message: MessageId, recipient: &str) -> Result<PendingEntry> {
        self.lock()?
            .delete(message, recipient)
            .ok_or_else(|| Error::MessageNotFound(format!("pending {message} for {recipient}")))
    }

    /// Snapshot of every queued entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn list_all(&self) -> Result<Vec<PendingEntry>> {
        Ok(self.lock()?.list_all())
    }

    /// Discards every entry addressed to `recipient`, returning how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn drop_for_recipient(&self, recipient: &str) -> Result<usize> {
        Ok(self.lock()?.take_for_recipient(recipient).len())
    }
}
