//! # courier-core
//!
//! Message dispatch and folder delivery for the Courier messaging platform.
//!
//! This crate provides:
//! - Identifier generation for messages and threads
//! - Per-account folder sets (Inbox, Archive, Sent, Scheduled) with queries
//! - A pending-delivery queue for recipients that have not registered yet
//! - The message dispatcher, including scheduled release
//! - Account lifecycle subscribers that provision folders and resolve
//!   pending deliveries

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod dispatch;
mod error;
pub mod folder;
pub mod ids;
pub mod message;
pub mod pending;
pub mod registration;
pub mod service;

pub use account::{
    Account, AccountDirectory, AccountId, AccountRegistry, AccountSubscriber, Deregistration,
    Registration, SubscriberFailure,
};
pub use config::CourierConfig;
pub use dispatch::{Dispatcher, Release, spawn_release_loop};
pub use error::{Error, ErrorKind, Result};
pub use folder::{
    FolderEntry, FolderKind, FolderStore, FolderSummary, QueryParams, QueryResult, SortKey,
    SortOrder,
};
pub use ids::{IdGenerator, MessageId, ThreadId};
pub use message::{Message, StoredMessage, ValidationError};
pub use pending::{PendingEntry, PendingQueue};
pub use registration::{FolderProvisioner, PendingResolver};
pub use service::Courier;
