//! Directory picker
//!
//! The broker launches the platform picker and later receives the user's
//! answer as an [`ActivityResult`]. Launching and answering are decoupled:
//! whoever plays the picker UI reports back through
//! `StorageAccessBroker::on_activity_result`.

use log::debug;
use tokio::sync::mpsc;

use crate::error::PickerError;
use crate::handle::DirectoryHandle;

/// Request code the broker tags its picker launches with.
pub const REQUEST_CODE_OPEN_DOCUMENT_TREE: i32 = 42;

/// What the picker is asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerIntent {
    pub grant_read: bool,
    pub grant_persistable: bool,
    /// Best-effort starting location; the picker falls back to its default.
    pub initial_location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerData {
    pub handle: Option<DirectoryHandle>,
}

/// The platform's answer to a picker launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityResult {
    pub request_code: i32,
    pub result_code: ResultCode,
    pub data: Option<PickerData>,
}

impl ActivityResult {
    pub fn approved(request_code: i32, handle: DirectoryHandle) -> Self {
        Self {
            request_code,
            result_code: ResultCode::Ok,
            data: Some(PickerData {
                handle: Some(handle),
            }),
        }
    }

    /// Approved, but the platform returned no handle.
    pub fn approved_without_handle(request_code: i32) -> Self {
        Self {
            request_code,
            result_code: ResultCode::Ok,
            data: Some(PickerData { handle: None }),
        }
    }

    pub fn canceled(request_code: i32) -> Self {
        Self {
            request_code,
            result_code: ResultCode::Canceled,
            data: None,
        }
    }
}

pub trait PickerLauncher: Send + Sync {
    /// Starts the picker UI. Returns once the UI is up, not when the user answers.
    fn launch(&self, request_code: i32, intent: PickerIntent) -> Result<(), PickerError>;
}

/// A picker launch waiting for someone to play the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerLaunch {
    pub request_code: i32,
    pub intent: PickerIntent,
}

/// Forwards launches to a channel.
pub struct ChannelPickerLauncher {
    tx: mpsc::UnboundedSender<PickerLaunch>,
}

impl ChannelPickerLauncher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PickerLaunch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PickerLauncher for ChannelPickerLauncher {
    fn launch(&self, request_code: i32, intent: PickerIntent) -> Result<(), PickerError> {
        debug!("Launching directory picker (request code {})", request_code);
        self.tx
            .send(PickerLaunch {
                request_code,
                intent,
            })
            .map_err(|_| PickerError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_launcher_forwards_intent() {
        let (launcher, mut rx) = ChannelPickerLauncher::new();
        let intent = PickerIntent {
            grant_read: true,
            grant_persistable: true,
            initial_location: None,
        };

        launcher
            .launch(REQUEST_CODE_OPEN_DOCUMENT_TREE, intent.clone())
            .unwrap();

        let launch = rx.try_recv().unwrap();
        assert_eq!(launch.request_code, 42);
        assert_eq!(launch.intent, intent);
    }

    #[test]
    fn test_closed_channel_is_an_error() {
        let (launcher, rx) = ChannelPickerLauncher::new();
        drop(rx);

        let intent = PickerIntent {
            grant_read: true,
            grant_persistable: true,
            initial_location: None,
        };
        assert_eq!(
            launcher.launch(REQUEST_CODE_OPEN_DOCUMENT_TREE, intent),
            Err(PickerError::ChannelClosed)
        );
    }
}
