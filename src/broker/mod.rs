//! Storage access broker
//!
//! Grants directory handles through the platform picker and enumerates the
//! files beneath them. At most one access request is pending at a time.

pub mod core;
pub mod pending;

pub use self::core::{BrokerOptions, StorageAccessBroker};
pub use pending::{AccessOutcome, PendingPolicy};
