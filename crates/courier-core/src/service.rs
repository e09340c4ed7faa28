//! The assembled messaging core.

use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::account::{AccountDirectory, AccountRegistry};
use crate::config::CourierConfig;
use crate::dispatch::Dispatcher;
use crate::folder::FolderStore;
use crate::pending::PendingQueue;
use crate::registration::{FolderProvisioner, PendingResolver};

/// One explicitly constructed instance of every component, wired together.
///
/// Instances share nothing with each other, so tests can build as many as
/// they like.
#[derive(Debug, Clone)]
pub struct Courier {
    config: CourierConfig,
    accounts: Arc<AccountRegistry>,
    folders: Arc<FolderStore>,
    pending: Arc<PendingQueue>,
    dispatcher: Arc<Dispatcher>,
}

impl Courier {
    /// Builds the components and subscribes folder provisioning ahead of
    /// pending resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if subscribing fails.
    pub fn new(config: CourierConfig) -> Result<Self> {
        let accounts = Arc::new(AccountRegistry::new(config.max_email_len));
        let folders = Arc::new(FolderStore::new(&config));
        let pending = Arc::new(PendingQueue::new());
        let dispatcher = Arc::new(Dispatcher::new(
            &config,
            Arc::clone(&accounts) as Arc<dyn AccountDirectory>,
            Arc::clone(&folders),
            Arc::clone(&pending),
        ));

        accounts.subscribe(Arc::new(FolderProvisioner::new(Arc::clone(&folders))))?;
        accounts.subscribe(Arc::new(PendingResolver::new(
            Arc::clone(&folders),
            Arc::clone(&pending),
        )))?;
        info!("Courier core ready");

        Ok(Self {
            config,
            accounts,
            folders,
            pending,
            dispatcher,
        })
    }

    /// The configuration this instance was built with.
    #[must_use]
    pub const fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// The account registry.
    #[must_use]
    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    /// The folder store.
    #[must_use]
    pub fn folders(&self) -> &FolderStore {
        &self.folders
    }

    /// The pending-delivery queue.
    #[must_use]
    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// The dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::folder::{FolderKind, QueryParams};
    use crate::message::Message;

    #[test]
    fn registration_provisions_then_resolves() {
        let courier = Courier::new(CourierConfig::default()).unwrap();
        courier.accounts().register("alice@x.com").unwrap();
        let id = courier
            .dispatcher()
            .dispatch(Message::new("alice@x.com", ["carol@x.com"], "early"))
            .unwrap();
        assert_eq!(courier.pending().list_all().unwrap().len(), 1);

        let registration = courier.accounts().register("Carol@X.com").unwrap();
        assert!(registration.is_clean());
        let carol = registration.account.id;

        assert!(courier.pending().list_all().unwrap().is_empty());
        let entry = courier.folders().get_one(carol, id).unwrap();
        assert_eq!(entry.folder, FolderKind::Inbox);
    }

    #[test]
    fn deletion_removes_folders_and_pending() {
        let courier = Courier::new(CourierConfig::default()).unwrap();
        let alice = courier.accounts().register("alice@x.com").unwrap().account.id;
        let bob = courier.accounts().register("bob@x.com").unwrap().account.id;
        courier
            .dispatcher()
            .dispatch(Message::new("bob@x.com", ["alice@x.com", "ghost@x.com"], "hi"))
            .unwrap();

        let report = courier.accounts().delete(alice).unwrap();
        assert!(report.failures.is_empty());
        assert!(!courier.folders().has_folder_set(alice).unwrap());
        assert!(courier.folders().has_folder_set(bob).unwrap());
        assert_eq!(courier.pending().list_all().unwrap().len(), 1);

        // Messages to the deleted address queue again until someone re-registers.
        courier
            .dispatcher()
            .dispatch(Message::new("bob@x.com", ["alice@x.com"], "again"))
            .unwrap();
        assert_eq!(courier.pending().list_all().unwrap().len(), 2);
        let sent = courier
            .folders()
            .query(bob, &QueryParams::new(FolderKind::Sent))
            .unwrap();
        assert_eq!(sent.num_total, 2);
    }
}
