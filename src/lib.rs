//! Scoped-storage access broker.
//!
//! Hands out user-approved directory handles through a platform picker and
//! lists the files beneath them, exposed to a host application over a
//! line-oriented method-call bridge.

pub mod bridge;
pub mod broker;
pub mod config;
pub mod console;
pub mod error;
pub mod handle;
pub mod platform;
pub mod server;
pub mod utils;

pub use broker::StorageAccessBroker;
pub use server::Server;
