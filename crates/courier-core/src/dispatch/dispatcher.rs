//! The message dispatcher.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::schedule::ScheduleBook;
use crate::account::{AccountDirectory, is_well_formed_email, normalize_email};
use crate::config::CourierConfig;
use crate::folder::{FolderEntry, FolderKind, FolderStore};
use crate::ids::{IdGenerator, MessageId, ThreadId};
use crate::message::{Message, StoredMessage, ValidationError, validate_message};
use crate::pending::{PendingEntry, PendingQueue};
use crate::{Error, Result};

/// Outcome of releasing one scheduled message.
#[derive(Debug)]
pub struct Release {
    /// The released message.
    pub message_id: MessageId,
    /// `Err(PartialDelivery)` if some deliveries failed.
    pub outcome: Result<()>,
}

/// Accepts messages and delivers them into folders.
///
/// Owns the immutable stored messages. Fan-out holds the pending-queue lock
/// for its whole recipient loop and takes Folder Store locks inside it, the
/// same order registration resolution uses.
pub struct Dispatcher {
    directory: Arc<dyn AccountDirectory>,
    folders: Arc<FolderStore>,
    pending: Arc<PendingQueue>,
    ids: IdGenerator,
    messages: RwLock<HashMap<MessageId, Arc<StoredMessage>>>,
    schedule: Mutex<ScheduleBook>,
    max_email_len: usize,
    grace: chrono::Duration,
}

impl Dispatcher {
    /// Creates a dispatcher over the given collaborators.
    #[must_use]
    pub fn new(
        config: &CourierConfig,
        directory: Arc<dyn AccountDirectory>,
        folders: Arc<FolderStore>,
        pending: Arc<PendingQueue>,
    ) -> Self {
        Self {
            directory,
            folders,
            pending,
            ids: IdGenerator::new(),
            messages: RwLock::new(HashMap::new()),
            schedule: Mutex::new(ScheduleBook::default()),
            max_email_len: config.max_email_len,
            grace: config.schedule_grace(),
        }
    }

    /// Validates, stores and delivers (or schedules) a message.
    ///
    /// # Errors
    ///
    /// Validation failures and an unknown parent are reported before any
    /// identifier is assigned. After assignment, failed deliveries surface as
    /// [`Error::PartialDelivery`]: the message stays stored and retrievable.
    pub fn dispatch(&self, message: Message) -> Result<MessageId> {
        self.dispatch_at(message, Utc::now())
    }

    /// [`Dispatcher::dispatch`] with an explicit notion of "now".
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn dispatch_at(&self, message: Message, now: DateTime<Utc>) -> Result<MessageId> {
        validate_message(&message, self.max_email_len, self.directory.as_ref())?;
        let sender_id = self
            .directory
            .resolve_email(&message.sender_email)?
            .ok_or(ValidationError::SenderNotRegistered)?;

        let thread_id = match message.parent_id {
            None => self.ids.next_thread_id(),
            Some(parent) => self.retrieve_message(parent)?.thread_id,
        };
        let id = self.ids.next_message_id();

        let deferred = message
            .scheduled_at
            .filter(|at| now.checked_add_signed(self.grace).is_some_and(|limit| *at > limit));
        let stored = Arc::new(StoredMessage {
            id,
            thread_id,
            sent_at: deferred.unwrap_or(now),
            sender_id,
            message,
        });

        self.messages
            .write()
            .map_err(|_| Error::poisoned("message store"))?
            .insert(id, Arc::clone(&stored));

        if let Some(at) = deferred {
            info!("Message {id} from {sender_id} scheduled for {at}");
            let mut failures = Vec::new();
            if let Err(e) = self.schedule_release(at, id) {
                failures.push(format!("schedule: {e}"));
            }
            let entry = FolderEntry::new(stored, FolderKind::Scheduled);
            if let Err(e) = self.folders.add_entry(FolderKind::Scheduled, sender_id, entry) {
                failures.push(format!("scheduled folder of {sender_id}: {e}"));
            }
            return into_outcome(id, failures).map(|()| id);
        }

        info!("Message {id} from {sender_id} accepted in thread {thread_id}");
        let failures = self
            .fan_out(&stored)
            .unwrap_or_else(|e| vec![format!("fan-out: {e}")]);
        into_outcome(id, failures).map(|()| id)
    }

    /// Looks up a stored message.
    ///
    /// # Errors
    ///
    /// Returns `MessageNotFound` if no message has this id.
    pub fn retrieve_message(&self, id: MessageId) -> Result<Arc<StoredMessage>> {
        self.messages
            .read()
            .map_err(|_| Error::poisoned("message store"))?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))
    }

    /// Every stored message of a thread, in message-id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the message store lock is poisoned.
    pub fn thread_messages(&self, thread: ThreadId) -> Result<Vec<Arc<StoredMessage>>> {
        let mut messages: Vec<_> = self
            .messages
            .read()
            .map_err(|_| Error::poisoned("message store"))?
            .values()
            .filter(|m| m.thread_id == thread)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }

    /// Delivers every scheduled message due at or before `now`.
    ///
    /// Each message leaves its sender's Scheduled folder and then fans out as
    /// if dispatched immediately. A message is released at most once.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule lock is poisoned; per-message failures
    /// are reported in each [`Release`].
    pub fn release_due(&self, now: DateTime<Utc>) -> Result<Vec<Release>> {
        let due = self
            .schedule
            .lock()
            .map_err(|_| Error::poisoned("schedule"))?
            .take_due(now);

        let mut released = Vec::with_capacity(due.len());
        for id in due {
            let outcome = self.release(id);
            released.push(Release {
                message_id: id,
                outcome,
            });
        }
        Ok(released)
    }

    /// Number of messages waiting for their scheduled time.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule lock is poisoned.
    pub fn scheduled_count(&self) -> Result<usize> {
        Ok(self
            .schedule
            .lock()
            .map_err(|_| Error::poisoned("schedule"))?
            .len())
    }

    fn schedule_release(&self, at: DateTime<Utc>, id: MessageId) -> Result<()> {
        self.schedule
            .lock()
            .map_err(|_| Error::poisoned("schedule"))?
            .insert(at, id);
        Ok(())
    }

    /// Fans out one due message. If fan-out cannot start, the message goes
    /// back to the Scheduled folder and the schedule for a later pass.
    fn release(&self, id: MessageId) -> Result<()> {
        let stored = self.retrieve_message(id).map_err(|e| Error::PartialDelivery {
            message_id: id,
            failures: vec![format!("release: {e}")],
        })?;
        let sender = stored.sender_id;
        let mut failures = Vec::new();
        let unscheduled = match self.folders.remove_entry(FolderKind::Scheduled, sender, id) {
            Ok(entry) => Some(entry),
            Err(e) => {
                failures.push(format!("scheduled folder of {sender}: {e}"));
                None
            }
        };

        info!("Releasing scheduled message {id}");
        match self.fan_out(&stored) {
            Ok(delivery) => failures.extend(delivery),
            Err(e) => {
                warn!("Release of message {id} deferred: {e}");
                failures.push(format!("fan-out: {e}"));
                if let Some(entry) = unscheduled {
                    if let Err(e) = self.folders.add_entry(FolderKind::Scheduled, sender, entry) {
                        failures.push(format!("scheduled folder of {sender}: {e}"));
                    }
                }
                if let Err(e) = self.schedule_release(stored.sent_at, id) {
                    failures.push(format!("schedule: {e}"));
                }
            }
        }
        into_outcome(id, failures)
    }

    /// Delivers to the sender's Sent folder and every recipient.
    ///
    /// Returns one description per failed delivery.
    fn fan_out(&self, stored: &Arc<StoredMessage>) -> Result<Vec<String>> {
        let mut failures = Vec::new();
        let mut pending = self.pending.lock()?;

        let sent = FolderEntry::new(Arc::clone(stored), FolderKind::Sent);
        if let Err(e) = self.folders.add_entry(FolderKind::Sent, stored.sender_id, sent) {
            failures.push(format!("sent folder of {}: {e}", stored.sender_id));
        }

        for recipient in self.recipients(&stored.message) {
            let entry = FolderEntry::new(Arc::clone(stored), FolderKind::Inbox);
            let account = match self.directory.resolve_email(&recipient) {
                Ok(Some(account)) => account,
                Ok(None) => {
                    pending.enqueue(PendingEntry::new(entry, recipient));
                    continue;
                }
                Err(e) => {
                    failures.push(format!("{recipient}: {e}"));
                    continue;
                }
            };
            match self.folders.add_entry(FolderKind::Inbox, account, entry.clone()) {
                Ok(()) => debug!("Delivered message {} to {recipient}", stored.id),
                // Registered but not yet provisioned: resolution picks it up.
                Err(Error::AccountNotFound(_)) => {
                    pending.enqueue(PendingEntry::new(entry, recipient));
                }
                Err(e) => failures.push(format!("{recipient}: {e}")),
            }
        }
        Ok(failures)
    }

    /// Normalised, de-duplicated, well-formed recipients in submission order.
    fn recipients(&self, message: &Message) -> Vec<String> {
        let mut seen = HashSet::new();
        message
            .recipients
            .iter()
            .filter(|r| {
                let ok = is_well_formed_email(r, self.max_email_len);
                if !ok {
                    warn!("Skipping malformed recipient {r:?}");
                }
                ok
            })
            .map(|r| normalize_email(r))
            .filter(|r| seen.insert(r.clone()))
            .collect()
    }
}

fn into_outcome(message_id: MessageId, failures: Vec<String>) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        warn!("Message {message_id} partially delivered: {failures:?}");
        Err(Error::PartialDelivery {
            message_id,
            failures,
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ids", &self.ids)
            .field("max_email_len", &self.max_email_len)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}
