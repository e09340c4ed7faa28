//! Pending deliveries for recipients that are not yet registered.

mod model;
mod queue;

pub use model::PendingEntry;
pub use queue::{PendingQueue, PendingSet};
