//! Per-account folders and folder queries.
//!
//! Every account owns exactly four folders. Inbox and Archive hold entries
//! with per-recipient viewed/starred state; Sent and Scheduled hold plain
//! stored messages.

mod model;
mod query;
mod store;

pub use model::{FolderEntry, FolderKind, FolderSummary};
pub use query::{QueryParams, QueryResult, SortKey, SortOrder};
pub use store::FolderStore;
