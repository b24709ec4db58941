//! Bridge server
//!
//! Accepts host application connections and serves the method-call bridge
//! on each of them.

pub mod core;
pub mod framing;
pub mod session;

pub use self::core::Server;
