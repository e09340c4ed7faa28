//! Folder provisioning on account lifecycle events.

use std::sync::Arc;

use crate::Result;
use crate::account::{Account, AccountSubscriber};
use crate::folder::FolderStore;

/// Creates an account's folder set on registration and removes it on deletion.
#[derive(Debug, Clone)]
pub struct FolderProvisioner {
    folders: Arc<FolderStore>,
}

impl FolderProvisioner {
    /// Creates a provisioner over `folders`.
    #[must_use]
    pub const fn new(folders: Arc<FolderStore>) -> Self {
        Self { folders }
    }
}

impl AccountSubscriber for FolderProvisioner {
    fn name(&self) -> &'static str {
        "folder-provisioner"
    }

    fn on_registered(&self, account: &Account) -> Result<()> {
        self.folders.create_folder_set(account.id)
    }

    fn on_deleted(&self, account: &Account) -> Result<()> {
        self.folders.remove_folder_set(account.id)
    }
}
