//! Platform integration
//!
//! Seams between the broker and the platform's picker UI, permission store
//! and document provider, plus the local implementations of each.

pub mod grants;
pub mod picker;
pub mod provider;

pub use grants::{FileGrantStore, GrantMode, GrantStore, InMemoryGrantStore, PersistedGrant};
pub use picker::{
    ActivityResult, ChannelPickerLauncher, PickerData, PickerIntent, PickerLaunch, PickerLauncher,
    REQUEST_CODE_OPEN_DOCUMENT_TREE, ResultCode,
};
pub use provider::{DocumentEntry, DocumentKind, DocumentProvider, LocalDocumentProvider};
