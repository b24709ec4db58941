//! Error handling
//!
//! Defines error types and handling for the storage access broker.

pub mod handlers;
pub mod types;

pub use types::*;
