//! Account lifecycle subscribers that keep folders and pending deliveries in
//! step with the account registry.

mod provisioner;
mod resolver;

pub use provisioner::FolderProvisioner;
pub use resolver::PendingResolver;
