//! Capability handles
//!
//! Typed forms of the opaque strings exchanged with the host application.

mod document_id;
mod uri;

pub use document_id::DocumentId;
pub use uri::{DirectoryHandle, FileRef, document_uri};
