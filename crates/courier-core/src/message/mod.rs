//! Messages as submitted and as stored.

mod model;
mod validation;

pub use model::{Message, StoredMessage};
pub use validation::{ValidationError, validate_message};
