//! Account collaborator.
//!
//! Accounts are owned elsewhere; this module defines the lookup interface the
//! core consumes, the registration event subscribers hook into, and an
//! in-memory registry implementing both.

mod directory;
mod model;
mod validation;

pub use directory::{
    AccountDirectory, AccountRegistry, AccountSubscriber, Deregistration, Registration,
    SubscriberFailure,
};
pub use model::{Account, AccountId};
pub use validation::{is_well_formed_email, normalize_email};
