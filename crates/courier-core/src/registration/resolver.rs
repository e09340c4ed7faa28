//! Delivers queued messages once their recipient registers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::account::{Account, AccountSubscriber};
use crate::folder::{FolderKind, FolderStore};
use crate::pending::PendingQueue;
use crate::{Error, Result};

/// Drains pending entries addressed to a newly registered account into its
/// Inbox, and discards them when the account is deleted.
///
/// Takes the pending-queue lock before touching the Folder Store, the same
/// order the dispatcher uses.
#[derive(Debug, Clone)]
pub struct PendingResolver {
    folders: Arc<FolderStore>,
    pending: Arc<PendingQueue>,
}

impl PendingResolver {
    /// Creates a resolver over the shared store and queue.
    #[must_use]
    pub const fn new(folders: Arc<FolderStore>, pending: Arc<PendingQueue>) -> Self {
        Self { folders, pending }
    }
}

impl AccountSubscriber for PendingResolver {
    fn name(&self) -> &'static str {
        "pending-resolver"
    }

    fn on_registered(&self, account: &Account) -> Result<()> {
        let mut pending = self.pending.lock()?;
        let waiting = pending.take_for_recipient(&account.email);
        if waiting.is_empty() {
            return Ok(());
        }

        let total = waiting.len();
        let mut first_error = None;
        for queued in waiting {
            let message_id = queued.entry.message_id;
            match self
                .folders
                .add_entry(FolderKind::Inbox, account.id, queued.entry.clone())
            {
                Ok(()) => debug!("Resolved pending message {message_id} for {}", account.email),
                Err(Error::AlreadyExists(_)) => {
                    debug!("Pending message {message_id} already in Inbox of {}", account.id);
                }
                Err(e) => {
                    // Keep it queued; a later registration attempt may succeed.
                    warn!("Could not resolve message {message_id} for {}: {e}", account.email);
                    pending.enqueue(queued);
                    first_error.get_or_insert(e);
                }
            }
        }

        info!("Resolved {total} pending message(s) for {}", account.email);
        first_error.map_or(Ok(()), Err)
    }

    fn on_deleted(&self, account: &Account) -> Result<()> {
        let dropped = self.pending.drop_for_recipient(&account.email)?;
        if dropped > 0 {
            info!("Dropped {dropped} pending message(s) for deleted {}", account.email);
        }
        Ok(())
    }
}
