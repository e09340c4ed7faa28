//! Folder data models.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MessageId;
use crate::message::StoredMessage;
use crate::{Error, Result};

/// The four folders every account owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderKind {
    /// Received messages.
    Inbox,
    /// Received messages put aside by the owner.
    Archive,
    /// Messages the owner has sent.
    Sent,
    /// Messages the owner has scheduled for later delivery.
    Scheduled,
}

impl FolderKind {
    /// All folders in index order.
    pub const ALL: [Self; 4] = [Self::Inbox, Self::Archive, Self::Sent, Self::Scheduled];

    /// Number of folders per account.
    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`FolderKind::ALL`]; also the wire index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Inbox => 0,
            Self::Archive => 1,
            Self::Sent => 2,
            Self::Scheduled => 3,
        }
    }

    /// Converts a wire index into a folder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the index is outside `0..4`. Out-of-range
    /// indices are never clamped.
    pub fn from_index(index: i64) -> Result<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| Error::InvalidArgument(format!("folder index {index}")))
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Archive => "Archive",
            Self::Sent => "Sent",
            Self::Scheduled => "Scheduled",
        }
    }

    /// Whether entries in this folder carry viewed/starred state.
    #[must_use]
    pub const fn tracks_state(self) -> bool {
        matches!(self, Self::Inbox | Self::Archive)
    }
}

impl std::fmt::Display for FolderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One recipient's view of a stored message inside one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    /// Id of the referenced message.
    pub message_id: MessageId,
    /// When the entry was last marked viewed.
    pub viewed_at: Option<DateTime<Utc>>,
    /// Viewed flag.
    pub is_viewed: bool,
    /// Starred flag.
    pub is_starred: bool,
    /// Folder currently holding the entry.
    pub folder: FolderKind,
    /// The immutable message.
    pub message: Arc<StoredMessage>,
}

impl FolderEntry {
    /// Creates an unviewed, unstarred entry.
    #[must_use]
    pub fn new(message: Arc<StoredMessage>, folder: FolderKind) -> Self {
        Self {
            message_id: message.id,
            viewed_at: None,
            is_viewed: false,
            is_starred: false,
            folder,
            message,
        }
    }

    /// Sets the viewed flag, stamping `now` or clearing the timestamp.
    pub fn set_viewed(&mut self, viewed: bool, now: DateTime<Utc>) {
        self.is_viewed = viewed;
        self.viewed_at = if viewed { Some(now) } else { None };
    }
}

/// Per-folder counters for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FolderSummary {
    /// Which folder.
    pub folder: FolderKind,
    /// Folder display name.
    pub name: &'static str,
    /// Number of entries.
    pub num_total: usize,
    /// Number of unviewed entries; always 0 for Sent and Scheduled.
    pub num_unviewed: usize,
}

/// Contents of a single folder, tagged by the shape of data it holds.
#[derive(Debug)]
pub(crate) enum FolderContents {
    /// Inbox/Archive: entries with mutable per-recipient state.
    Tracked(BTreeMap<MessageId, FolderEntry>),
    /// Sent/Scheduled: the stored message only.
    Plain(BTreeMap<MessageId, Arc<StoredMessage>>),
}

impl FolderContents {
    fn for_kind(kind: FolderKind) -> Self {
        if kind.tracks_state() {
            Self::Tracked(BTreeMap::new())
        } else {
            Self::Plain(BTreeMap::new())
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Tracked(map) => map.len(),
            Self::Plain(map) => map.len(),
        }
    }

    pub(crate) fn contains(&self, id: MessageId) -> bool {
        match self {
            Self::Tracked(map) => map.contains_key(&id),
            Self::Plain(map) => map.contains_key(&id),
        }
    }

    pub(crate) fn unviewed(&self) -> usize {
        match self {
            Self::Tracked(map) => map.values().filter(|e| !e.is_viewed).count(),
            Self::Plain(_) => 0,
        }
    }

    /// Inserts an entry, projecting it to a plain message for Sent/Scheduled.
    pub(crate) fn insert(&mut self, mut entry: FolderEntry, kind: FolderKind) {
        match self {
            Self::Tracked(map) => {
                entry.folder = kind;
                map.insert(entry.message_id, entry);
            }
            Self::Plain(map) => {
                map.insert(entry.message_id, entry.message);
            }
        }
    }

    pub(crate) fn remove(&mut self, id: MessageId, kind: FolderKind) -> Option<FolderEntry> {
        match self {
            Self::Tracked(map) => map.remove(&id),
            Self::Plain(map) => map.remove(&id).map(|m| FolderEntry::new(m, kind)),
        }
    }

    pub(crate) fn get(&self, id: MessageId, kind: FolderKind) -> Option<FolderEntry> {
        match self {
            Self::Tracked(map) => map.get(&id).cloned(),
            Self::Plain(map) => map.get(&id).map(|m| FolderEntry::new(Arc::clone(m), kind)),
        }
    }

    pub(crate) fn get_tracked_mut(&mut self, id: MessageId) -> Option<&mut FolderEntry> {
        match self {
            Self::Tracked(map) => map.get_mut(&id),
            Self::Plain(_) => None,
        }
    }

    /// Materializes every entry in ascending message-id order.
    ///
    /// Plain messages are wrapped into zero-valued entries.
    pub(crate) fn entries(&self, kind: FolderKind) -> Vec<FolderEntry> {
        match self {
            Self::Tracked(map) => map.values().cloned().collect(),
            Self::Plain(map) => map
                .values()
                .map(|m| FolderEntry::new(Arc::clone(m), kind))
                .collect(),
        }
    }
}

/// The four folders of one account.
#[derive(Debug)]
pub(crate) struct FolderSet {
    folders: [FolderContents; FolderKind::COUNT],
}

impl FolderSet {
    pub(crate) fn new() -> Self {
        Self {
            folders: FolderKind::ALL.map(FolderContents::for_kind),
        }
    }

    pub(crate) fn folder(&self, kind: FolderKind) -> &FolderContents {
        &self.folders[kind.index()]
    }

    pub(crate) fn folder_mut(&mut self, kind: FolderKind) -> &mut FolderContents {
        &mut self.folders[kind.index()]
    }
}
