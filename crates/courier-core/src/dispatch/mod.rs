//! Message dispatch: validation, identifier assignment, scheduling and
//! fan-out into folders and the pending queue.

mod dispatcher;
mod schedule;

pub use dispatcher::{Dispatcher, Release};
pub use schedule::spawn_release_loop;
