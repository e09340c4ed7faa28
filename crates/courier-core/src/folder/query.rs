//! Folder query parameters, sorting and pagination.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{FolderEntry, FolderKind};
use crate::{Error, Result};

/// Sort key for folder queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// Message sent-at time.
    #[default]
    Time,
    /// Subject, lexicographic.
    Subject,
    /// Sender address, lexicographic.
    Sender,
}

impl SortKey {
    /// Converts a wire index (`0` time, `1` subject, `2` sender).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any other index.
    pub fn from_index(index: i64) -> Result<Self> {
        match index {
            0 => Ok(Self::Time),
            1 => Ok(Self::Subject),
            2 => Ok(Self::Sender),
            _ => Err(Error::InvalidArgument(format!("sort key {index}"))),
        }
    }

    fn compare(self, a: &FolderEntry, b: &FolderEntry) -> Ordering {
        match self {
            Self::Time => a.message.sent_at.cmp(&b.message.sent_at),
            Self::Subject => a.message.subject().cmp(b.message.subject()),
            Self::Sender => a.message.sender_email().cmp(b.message.sender_email()),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Converts the signed wire form: `-1` is descending, anything else ascending.
    #[must_use]
    pub const fn from_signed(value: i64) -> Self {
        if value == -1 {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

/// What to fetch from a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Folder to read.
    pub folder: FolderKind,
    /// Sort key.
    pub sort_by: SortKey,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Maximum number of entries to return.
    pub limit: usize,
    /// Zero-based page; the offset is `page * limit`.
    pub page: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            folder: FolderKind::Inbox,
            sort_by: SortKey::Time,
            sort_order: SortOrder::Ascending,
            limit: 10,
            page: 0,
        }
    }
}

impl QueryParams {
    /// First page of `folder`, oldest first.
    #[must_use]
    pub fn new(folder: FolderKind) -> Self {
        Self {
            folder,
            ..Self::default()
        }
    }

    /// Builds parameters from raw wire values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unknown folder or sort index, or a
    /// negative limit or page.
    pub fn from_wire(folder: i64, sort_by: i64, sort_order: i64, limit: i64, page: i64) -> Result<Self> {
        let limit = usize::try_from(limit)
            .map_err(|_| Error::InvalidArgument(format!("limit {limit}")))?;
        let page =
            usize::try_from(page).map_err(|_| Error::InvalidArgument(format!("page {page}")))?;
        Ok(Self {
            folder: FolderKind::from_index(folder)?,
            sort_by: SortKey::from_index(sort_by)?,
            sort_order: SortOrder::from_signed(sort_order),
            limit,
            page,
        })
    }

    /// Sets the sort key and direction.
    #[must_use]
    pub const fn sorted(mut self, sort_by: SortKey, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Sets the page window.
    #[must_use]
    pub const fn page(mut self, limit: usize, page: usize) -> Self {
        self.limit = limit;
        self.page = page;
        self
    }
}

/// One page of a folder.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// The parameters that produced this page.
    pub requested: QueryParams,
    /// When the query ran.
    pub queried_at: DateTime<Utc>,
    /// Folder display name.
    pub folder_name: &'static str,
    /// Entries in the folder before pagination.
    pub num_total: usize,
    /// Unviewed entries in the folder; 0 for Sent and Scheduled.
    pub num_unviewed: usize,
    /// Length of `elems`.
    pub num_elems: usize,
    /// The page; empty, never absent, when nothing matches.
    pub elems: Vec<FolderEntry>,
}

/// Stable sort; equal keys keep their incoming order.
pub(crate) fn sort_entries(entries: &mut [FolderEntry], key: SortKey, order: SortOrder) {
    match order {
        SortOrder::Ascending => entries.sort_by(|a, b| key.compare(a, b)),
        SortOrder::Descending => entries.sort_by(|a, b| key.compare(b, a)),
    }
}

/// Cuts `page * limit ..` out of `entries`, at most `limit` long.
pub(crate) fn paginate(mut entries: Vec<FolderEntry>, limit: usize, page: usize) -> Vec<FolderEntry> {
    let Some(start) = page.checked_mul(limit) else {
        return Vec::new();
    };
    if start >= entries.len() {
        return Vec::new();
    }
    let end = start.saturating_add(limit).min(entries.len());
    entries.truncate(end);
    entries.drain(..start);
    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::AccountId;
    use crate::ids::{MessageId, ThreadId};
    use crate::message::{Message, StoredMessage};
    use chrono::Duration;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn entry(id: u64, subject: &str, sender: &str, minutes: i64) -> FolderEntry {
        let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        FolderEntry::new(
            Arc::new(StoredMessage {
                id: MessageId::new(id).unwrap(),
                thread_id: ThreadId::new(1).unwrap(),
                sent_at: base + Duration::minutes(minutes),
                sender_id: AccountId::new(1),
                message: Message::new(sender, ["r@x.com"], subject),
            }),
            FolderKind::Inbox,
        )
    }

    fn ids(entries: &[FolderEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.message_id.get()).collect()
    }

    #[test]
    fn from_wire_accepts_valid_values() {
        let params = QueryParams::from_wire(2, 1, -1, 25, 3).unwrap();
        assert_eq!(params.folder, FolderKind::Sent);
        assert_eq!(params.sort_by, SortKey::Subject);
        assert_eq!(params.sort_order, SortOrder::Descending);
        assert_eq!((params.limit, params.page), (25, 3));
    }

    #[test]
    fn from_wire_rejects_out_of_range() {
        assert!(QueryParams::from_wire(4, 0, 1, 10, 0).is_err());
        assert!(QueryParams::from_wire(0, 3, 1, 10, 0).is_err());
        assert!(QueryParams::from_wire(0, 0, 1, -1, 0).is_err());
        assert!(QueryParams::from_wire(0, 0, 1, 10, -1).is_err());
    }

    #[test]
    fn sort_order_wire_form() {
        assert_eq!(SortOrder::from_signed(-1), SortOrder::Descending);
        assert_eq!(SortOrder::from_signed(1), SortOrder::Ascending);
        assert_eq!(SortOrder::from_signed(0), SortOrder::Ascending);
    }

    #[test]
    fn sort_by_time_ascending_and_descending() {
        let mut entries = vec![entry(1, "a", "s@x", 30), entry(2, "b", "s@x", 10), entry(3, "c", "s@x", 20)];
        sort_entries(&mut entries, SortKey::Time, SortOrder::Ascending);
        assert_eq!(ids(&entries), vec![2, 3, 1]);
        sort_entries(&mut entries, SortKey::Time, SortOrder::Descending);
        assert_eq!(ids(&entries), vec![1, 3, 2]);
    }

    #[test]
    fn sort_by_sender() {
        let mut entries = vec![entry(1, "x", "zed@x", 0), entry(2, "x", "amy@x", 0)];
        sort_entries(&mut entries, SortKey::Sender, SortOrder::Ascending);
        assert_eq!(ids(&entries), vec![2, 1]);
    }

    #[test]
    fn ties_keep_incoming_order() {
        let mut entries = vec![entry(1, "same", "s@x", 0), entry(2, "same", "s@x", 0), entry(3, "same", "s@x", 0)];
        sort_entries(&mut entries, SortKey::Subject, SortOrder::Descending);
        assert_eq!(ids(&entries), vec![1, 2, 3]);
    }

    #[test]
    fn pagination_of_twenty_five() {
        let all: Vec<_> = (1..=25).map(|i| entry(i, "s", "s@x", 0)).collect();
        assert_eq!(paginate(all.clone(), 10, 0).len(), 10);
        assert_eq!(ids(&paginate(all.clone(), 10, 2)), (21..=25).collect::<Vec<_>>());
        assert!(paginate(all.clone(), 10, 3).is_empty());
        assert!(paginate(all, 0, 0).is_empty());
    }

    #[test]
    fn pagination_offset_overflow_is_empty() {
        let all: Vec<_> = (1..=3).map(|i| entry(i, "s", "s@x", 0)).collect();
        assert!(paginate(all, usize::MAX, 2).is_empty());
    }

    proptest! {
        #[test]
        fn page_len_is_min_of_limit_and_remaining(total in 0usize..60, limit in 0usize..20, page in 0usize..10) {
            let all: Vec<_> = (1..=total as u64).map(|i| entry(i, "s", "s@x", 0)).collect();
            let got = paginate(all, limit, page);
            let offset = page * limit;
            let expected = if offset >= total { 0 } else { limit.min(total - offset) };
            prop_assert_eq!(got.len(), expected);
            if let Some(first) = got.first() {
                prop_assert_eq!(first.message_id.get(), offset as u64 + 1);
            }
        }

        #[test]
        fn subject_sort_is_monotonic(subjects in proptest::collection::vec("[a-e]{0,4}", 0..30)) {
            let mut entries: Vec<_> = subjects
                .iter()
                .enumerate()
                .map(|(i, s)| entry(i as u64 + 1, s, "s@x", 0))
                .collect();

            sort_entries(&mut entries, SortKey::Subject, SortOrder::Ascending);
            prop_assert!(entries.windows(2).all(|w| w[0].message.subject() <= w[1].message.subject()));

            sort_entries(&mut entries, SortKey::Subject, SortOrder::Descending);
            prop_assert!(entries.windows(2).all(|w| w[0].message.subject() >= w[1].message.subject()));
        }
    }
}
