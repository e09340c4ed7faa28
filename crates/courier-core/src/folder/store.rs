//! The Folder Store: account id to folder set, with per-account locking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use super::model::{FolderEntry, FolderKind, FolderSet, FolderSummary};
use super::query::{QueryParams, QueryResult, paginate, sort_entries};
use crate::account::AccountId;
use crate::config::CourierConfig;
use crate::ids::MessageId;
use crate::{Error, Result};

/// Folders searched for viewed/starred updates, in order.
const STATEFUL: [FolderKind; 2] = [FolderKind::Inbox, FolderKind::Archive];

/// Owns every account's folder set.
///
/// The account map lock is only held long enough to clone the account's
/// handle; each folder set has its own lock, so accounts do not contend.
/// Moves take the account's write lock once, so queries never observe an
/// entry in both or neither folder.
#[derive(Debug)]
pub struct FolderStore {
    accounts: RwLock<HashMap<AccountId, Arc<RwLock<FolderSet>>>>,
    max_page_size: usize,
    max_page: usize,
}

impl FolderStore {
    /// Creates an empty store with the query bounds from `config`.
    #[must_use]
    pub fn new(config: &CourierConfig) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            max_page_size: config.max_page_size,
            max_page: config.max_page,
        }
    }

    /// Provisions the four empty folders of a new account.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the account already has folders.
    pub fn create_folder_set(&self, account: AccountId) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| Error::poisoned("folder store"))?;
        if accounts.contains_key(&account) {
            return Err(Error::AlreadyExists(format!("folders for account {account}")));
        }
        accounts.insert(account, Arc::new(RwLock::new(FolderSet::new())));
        info!("Provisioned folders for account {account}");
        Ok(())
    }

    /// Drops an account's folders.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account has no folders.
    pub fn remove_folder_set(&self, account: AccountId) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| Error::poisoned("folder store"))?;
        accounts
            .remove(&account)
            .ok_or_else(|| Error::AccountNotFound(account.to_string()))?;
        info!("Removed folders for account {account}");
        Ok(())
    }

    /// True if the account has been provisioned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn has_folder_set(&self, account: AccountId) -> Result<bool> {
        Ok(self
            .accounts
            .read()
            .map_err(|_| Error::poisoned("folder store"))?
            .contains_key(&account))
    }

    /// Inserts an entry keyed by its message id.
    ///
    /// Sent and Scheduled keep only the stored message; viewed/starred state
    /// of `entry` is discarded for them.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account has no folders and
    /// `AlreadyExists` if the folder already holds this message.
    pub fn add_entry(&self, folder: FolderKind, account: AccountId, entry: FolderEntry) -> Result<()> {
        let set = self.folder_set(account)?;
        let mut set = set.write().map_err(|_| Error::poisoned("folder set"))?;
        let contents = set.folder_mut(folder);
        if contents.contains(entry.message_id) {
            return Err(Error::AlreadyExists(format!(
                "message {} in {folder} of account {account}",
                entry.message_id
            )));
        }
        debug!("Adding message {} to {folder} of account {account}", entry.message_id);
        contents.insert(entry, folder);
        Ok(())
    }

    /// Removes one entry from a folder and returns it.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `MessageNotFound`.
    pub fn remove_entry(&self, folder: FolderKind, account: AccountId, message: MessageId) -> Result<FolderEntry> {
        let set = self.folder_set(account)?;
        let mut set = set.write().map_err(|_| Error::poisoned("folder set"))?;
        set.folder_mut(folder)
            .remove(message, folder)
            .ok_or_else(|| Error::MessageNotFound(format!("{message} in {folder}")))
    }

    /// Marks an Inbox or Archive entry viewed (stamping now) or unviewed.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, or `MessageNotFound` if the message is in
    /// neither Inbox nor Archive.
    pub fn update_viewed(&self, account: AccountId, message: MessageId, viewed: bool) -> Result<FolderEntry> {
        let now = Utc::now();
        self.update_state(account, message, |entry| entry.set_viewed(viewed, now))
    }

    /// Stars or unstars an Inbox or Archive entry.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, or `MessageNotFound` if the message is in
    /// neither Inbox nor Archive.
    pub fn update_starred(&self, account: AccountId, message: MessageId, starred: bool) -> Result<FolderEntry> {
        self.update_state(account, message, |entry| entry.is_starred = starred)
    }

    fn update_state(
        &self,
        account: AccountId,
        message: MessageId,
        apply: impl FnOnce(&mut FolderEntry),
    ) -> Result<FolderEntry> {
        let set = self.folder_set(account)?;
        let mut set = set.write().map_err(|_| Error::poisoned("folder set"))?;
        for folder in STATEFUL {
            if let Some(entry) = set.folder_mut(folder).get_tracked_mut(message) {
                apply(entry);
                return Ok(entry.clone());
            }
        }
        Err(Error::MessageNotFound(format!(
            "{message} in Inbox or Archive of account {account}"
        )))
    }

    /// Moves an entry between Inbox and Archive, atomically per account.
    ///
    /// Moving to the same folder is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either folder is Sent or Scheduled,
    /// `AccountNotFound`, `MessageNotFound` if the source lacks the entry, or
    /// `AlreadyExists` if the destination already holds it.
    pub fn move_entry(&self, account: AccountId, message: MessageId, from: FolderKind, to: FolderKind) -> Result<()> {
        if !from.tracks_state() || !to.tracks_state() {
            return Err(Error::InvalidArgument(format!("move from {from} to {to}")));
        }
        if from == to {
            return Ok(());
        }

        let set = self.folder_set(account)?;
        let mut set = set.write().map_err(|_| Error::poisoned("folder set"))?;
        if !set.folder(from).contains(message) {
            return Err(Error::MessageNotFound(format!("{message} in {from}")));
        }
        if set.folder(to).contains(message) {
            return Err(Error::AlreadyExists(format!("message {message} in {to}")));
        }
        let entry = set
            .folder_mut(from)
            .remove(message, from)
            .ok_or_else(|| Error::MessageNotFound(format!("{message} in {from}")))?;
        set.folder_mut(to).insert(entry, to);
        debug!("Moved message {message} from {from} to {to} for account {account}");
        Ok(())
    }

    /// Moves an Inbox entry to Archive.
    ///
    /// # Errors
    ///
    /// See [`FolderStore::move_entry`].
    pub fn archive(&self, account: AccountId, message: MessageId) -> Result<()> {
        self.move_entry(account, message, FolderKind::Inbox, FolderKind::Archive)
    }

    /// Moves an Archive entry back to Inbox.
    ///
    /// # Errors
    ///
    /// See [`FolderStore::move_entry`].
    pub fn unarchive(&self, account: AccountId, message: MessageId) -> Result<()> {
        self.move_entry(account, message, FolderKind::Archive, FolderKind::Inbox)
    }

    /// Finds a message in any of the account's folders.
    ///
    /// Folders are searched Inbox, Archive, Sent, Scheduled.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or `MessageNotFound`.
    pub fn get_one(&self, account: AccountId, message: MessageId) -> Result<FolderEntry> {
        let set = self.folder_set(account)?;
        let set = set.read().map_err(|_| Error::poisoned("folder set"))?;
        FolderKind::ALL
            .into_iter()
            .find_map(|folder| set.folder(folder).get(message, folder))
            .ok_or_else(|| Error::MessageNotFound(format!("{message} for account {account}")))
    }

    /// Reads one sorted page of a folder.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, or `InvalidArgument` if `limit` or `page`
    /// exceed the configured bounds. A page past the end is not an error.
    pub fn query(&self, account: AccountId, params: &QueryParams) -> Result<QueryResult> {
        if params.limit > self.max_page_size {
            return Err(Error::InvalidArgument(format!(
                "limit {} exceeds {}",
                params.limit, self.max_page_size
            )));
        }
        if params.page > self.max_page {
            return Err(Error::InvalidArgument(format!(
                "page {} exceeds {}",
                params.page, self.max_page
            )));
        }

        let set = self.folder_set(account)?;
        let (mut entries, num_unviewed) = {
            let set = set.read().map_err(|_| Error::poisoned("folder set"))?;
            let contents = set.folder(params.folder);
            (contents.entries(params.folder), contents.unviewed())
        };

        let num_total = entries.len();
        sort_entries(&mut entries, params.sort_by, params.sort_order);
        let elems = paginate(entries, params.limit, params.page);

        Ok(QueryResult {
            requested: *params,
            queried_at: Utc::now(),
            folder_name: params.folder.name(),
            num_total,
            num_unviewed,
            num_elems: elems.len(),
            elems,
        })
    }

    /// Totals and unviewed counts for each folder of an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`.
    pub fn folder_summaries(&self, account: AccountId) -> Result<Vec<FolderSummary>> {
        let set = self.folder_set(account)?;
        let set = set.read().map_err(|_| Error::poisoned("folder set"))?;
        Ok(FolderKind::ALL
            .into_iter()
            .map(|folder| {
                let contents = set.folder(folder);
                FolderSummary {
                    folder,
                    name: folder.name(),
                    num_total: contents.len(),
                    num_unviewed: contents.unviewed(),
                }
            })
            .collect())
    }

    fn folder_set(&self, account: AccountId) -> Result<Arc<RwLock<FolderSet>>> {
        self.accounts
            .read()
            .map_err(|_| Error::poisoned("folder store"))?
            .get(&account)
            .cloned()
            .ok_or_else(|| Error::AccountNotFound(account.to_string()))
    }
}
