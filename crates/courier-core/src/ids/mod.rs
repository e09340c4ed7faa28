//! Message and thread identifiers.
//!
//! Identifiers are non-zero 64-bit integers rendered as lowercase hex.

mod generator;
mod model;

pub use generator::IdGenerator;
pub use model::{MessageId, ThreadId};
