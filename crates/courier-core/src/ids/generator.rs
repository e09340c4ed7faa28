//! Identifier generator.

use std::sync::atomic::{AtomicU64, Ordering};

use super::model::{MessageId, ThreadId};

/// Issues strictly increasing message and thread identifiers.
///
/// Both counters start at zero and are pre-incremented, so 0 is never issued.
/// Counters live only as long as the generator; nothing is persisted.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_message: AtomicU64,
    last_thread: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator whose first identifiers will be 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_message: AtomicU64::new(0),
            last_thread: AtomicU64::new(0),
        }
    }

    /// Issues the next message identifier.
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow `u64::MAX`.
    #[must_use]
    pub fn next_message_id(&self) -> MessageId {
        MessageId(bump(&self.last_message, "message"))
    }

    /// Issues the next thread identifier.
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow `u64::MAX`.
    #[must_use]
    pub fn next_thread_id(&self) -> ThreadId {
        ThreadId(bump(&self.last_thread, "thread"))
    }

    /// Returns the last issued message identifier value (0 if none yet).
    #[must_use]
    pub fn last_message_id(&self) -> u64 {
        self.last_message.load(Ordering::Relaxed)
    }
}

/// Advances `counter` and returns the new value. An exhausted counter stays
/// at `u64::MAX`, so no value is ever issued twice.
fn bump(counter: &AtomicU64, what: &str) -> std::num::NonZeroU64 {
    let prev = counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        .unwrap_or_else(|_| panic!("{what} id counter overflow"));
    match std::num::NonZeroU64::new(prev + 1) {
        Some(n) => n,
        None => panic!("{what} id counter overflow"),
    }
}
