//! Deferred delivery bookkeeping and the release loop.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::dispatcher::Dispatcher;
use crate::ids::MessageId;

/// Scheduled messages ordered by due time.
#[derive(Debug, Default)]
pub(crate) struct ScheduleBook {
    due: BTreeSet<(DateTime<Utc>, MessageId)>,
}

impl ScheduleBook {
    pub(crate) fn insert(&mut self, at: DateTime<Utc>, message: MessageId) {
        self.due.insert((at, message));
    }

    /// Removes and returns every message due at or before `now`, oldest first.
    pub(crate) fn take_due(&mut self, now: DateTime<Utc>) -> Vec<MessageId> {
        let mut taken = Vec::new();
        while let Some(&(at, message)) = self.due.first() {
            if at > now {
                break;
            }
            self.due.pop_first();
            taken.push(message);
        }
        taken
    }

    pub(crate) fn len(&self) -> usize {
        self.due.len()
    }
}

/// Spawns a task that releases due scheduled messages every `period`.
///
/// The task runs until aborted. Per-message failures are logged; they do not
/// stop the loop.
pub fn spawn_release_loop(dispatcher: Arc<Dispatcher>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match dispatcher.release_due(Utc::now()) {
                Ok(released) => {
                    for release in released {
                        match release.outcome {
                            Ok(()) => debug!("Released scheduled message {}", release.message_id),
                            Err(e) => warn!("Scheduled message {} release: {e}", release.message_id),
                        }
                    }
                }
                Err(e) => warn!("Scheduled release pass failed: {e}"),
            }
        }
    })
}
