//! Account lookup interface and the in-memory registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use tracing::{debug, info, warn};

use super::model::{Account, AccountId};
use super::validation::{is_well_formed_email, normalize_email};
use crate::{Error, Result};

/// Lookups the core needs from the account collaborator.
pub trait AccountDirectory: Send + Sync {
    /// Resolves an email address to the owning account, if registered.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the lookup itself failed; an unknown address is
    /// `Ok(None)`.
    fn resolve_email(&self, email: &str) -> Result<Option<AccountId>>;

    /// Returns true if an account is registered under `email`.
    ///
    /// # Errors
    ///
    /// See [`AccountDirectory::resolve_email`].
    fn account_exists(&self, email: &str) -> Result<bool> {
        Ok(self.resolve_email(email)?.is_some())
    }
}

/// Receives account lifecycle events, synchronously, in subscription order.
pub trait AccountSubscriber: Send + Sync {
    /// Short name used when reporting failures.
    fn name(&self) -> &'static str;

    /// Called after an account has been inserted into the registry.
    ///
    /// # Errors
    ///
    /// Returned errors are collected into the [`Registration`] report; they do
    /// not stop later subscribers from running.
    fn on_registered(&self, account: &Account) -> Result<()>;

    /// Called after an account has been removed from the registry.
    ///
    /// # Errors
    ///
    /// Collected into the [`Deregistration`] report.
    fn on_deleted(&self, account: &Account) -> Result<()> {
        let _ = account;
        Ok(())
    }
}

/// A subscriber that failed while handling an event.
#[derive(Debug)]
pub struct SubscriberFailure {
    /// [`AccountSubscriber::name`] of the failing subscriber.
    pub subscriber: &'static str,
    /// What went wrong.
    pub error: Error,
}

/// Outcome of [`AccountRegistry::register`].
#[derive(Debug)]
pub struct Registration {
    /// The newly registered account.
    pub account: Account,
    /// Subscribers that failed; every subscriber ran regardless.
    pub failures: Vec<SubscriberFailure>,
}

impl Registration {
    /// True if every subscriber succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of [`AccountRegistry::delete`].
#[derive(Debug)]
pub struct Deregistration {
    /// The removed account.
    pub account: Account,
    /// Subscribers that failed; every subscriber ran regardless.
    pub failures: Vec<SubscriberFailure>,
}

#[derive(Default)]
struct Accounts {
    by_id: HashMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
}

/// In-memory account registry with lifecycle notifications.
pub struct AccountRegistry {
    accounts: RwLock<Accounts>,
    subscribers: RwLock<Vec<Arc<dyn AccountSubscriber>>>,
    last_id: AtomicU64,
    max_email_len: usize,
}

impl AccountRegistry {
    /// Creates an empty registry accepting addresses shorter than `max_email_len`.
    #[must_use]
    pub fn new(max_email_len: usize) -> Self {
        Self {
            accounts: RwLock::new(Accounts::default()),
            subscribers: RwLock::new(Vec::new()),
            last_id: AtomicU64::new(0),
            max_email_len,
        }
    }

    /// Appends a subscriber; it runs after every previously added one.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriber list lock is poisoned.
    pub fn subscribe(&self, subscriber: Arc<dyn AccountSubscriber>) -> Result<()> {
        let mut subscribers = self
            .subscribers
            .write()
            .map_err(|_| Error::poisoned("subscriber list"))?;
        debug!("Subscribed {} to account events", subscriber.name());
        subscribers.push(subscriber);
        Ok(())
    }

    /// Registers a new account and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed address and `AlreadyExists`
    /// if the address is taken. Subscriber failures are not errors; they are
    /// reported in the returned [`Registration`].
    pub fn register(&self, email: &str) -> Result<Registration> {
        if !is_well_formed_email(email, self.max_email_len) {
            return Err(Error::InvalidArgument(format!("email {email:?}")));
        }
        let email = normalize_email(email);

        let account = {
            let mut accounts = self
                .accounts
                .write()
                .map_err(|_| Error::poisoned("account registry"))?;
            if accounts.by_email.contains_key(&email) {
                return Err(Error::AlreadyExists(format!("account {email}")));
            }
            let id = AccountId(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
            let account = Account::new(id, email.clone());
            accounts.by_email.insert(email, id);
            accounts.by_id.insert(id, account.clone());
            account
        };

        info!("Registered account {} <{}>", account.id, account.email);
        let failures = self.notify(&account, |s, a| s.on_registered(a))?;
        Ok(Registration { account, failures })
    }

    /// Removes an account and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if no such account is registered.
    pub fn delete(&self, id: AccountId) -> Result<Deregistration> {
        let account = {
            let mut accounts = self
                .accounts
                .write()
                .map_err(|_| Error::poisoned("account registry"))?;
            let account = accounts
                .by_id
                .remove(&id)
                .ok_or_else(|| Error::AccountNotFound(id.to_string()))?;
            accounts.by_email.remove(&account.email);
            account
        };

        info!("Deleted account {} <{}>", account.id, account.email);
        let failures = self.notify(&account, |s, a| s.on_deleted(a))?;
        Ok(Deregistration { account, failures })
    }

    /// Looks up an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn get(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.read()?.by_id.get(&id).cloned())
    }

    /// All registered accounts, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn list(&self) -> Result<Vec<Account>> {
        let mut list: Vec<Account> = self.read()?.by_id.values().cloned().collect();
        list.sort_by_key(|a| a.id);
        Ok(list)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Accounts>> {
        self.accounts
            .read()
            .map_err(|_| Error::poisoned("account registry"))
    }

    fn notify(
        &self,
        account: &Account,
        event: impl Fn(&dyn AccountSubscriber, &Account) -> Result<()>,
    ) -> Result<Vec<SubscriberFailure>> {
        // Snapshot so a subscriber may subscribe others without deadlocking.
        let subscribers = self
            .subscribers
            .read()
            .map_err(|_| Error::poisoned("subscriber list"))?
            .clone();

        let mut failures = Vec::new();
        for subscriber in subscribers {
            if let Err(error) = event(subscriber.as_ref(), account) {
                warn!(
                    "Subscriber {} failed for account {}: {error}",
                    subscriber.name(),
                    account.id
                );
                failures.push(SubscriberFailure {
                    subscriber: subscriber.name(),
                    error,
                });
            }
        }
        Ok(failures)
    }
}

impl AccountDirectory for AccountRegistry {
    fn resolve_email(&self, email: &str) -> Result<Option<AccountId>> {
        let email = normalize_email(email);
        Ok(self.read()?.by_email.get(&email).copied())
    }
}

impl std::fmt::Debug for AccountRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountRegistry")
            .field("max_email_len", &self.max_email_len)
            .finish_non_exhaustive()
    }
}
