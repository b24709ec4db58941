use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::broker::pending::{AccessOutcome, PendingPolicy, PendingSlot};
use crate::error::{BrokerError, EnumerationError, ProviderError};
use crate::handle::{DirectoryHandle, FileRef};
use crate::platform::{
    ActivityResult, DocumentEntry, DocumentProvider, GrantMode, GrantStore, PickerIntent,
    PickerLauncher, REQUEST_CODE_OPEN_DOCUMENT_TREE, ResultCode,
};

/// Broker behaviour knobs, usually taken from `PlatformConfig`.
#[derive(Debug, Clone, Default)]
pub struct BrokerOptions {
    pub initial_location: Option<String>,
    pub supports_initial_hint: bool,
    pub pending_policy: PendingPolicy,
}

/// Mediates directory access requests and enumerates granted directories.
pub struct StorageAccessBroker {
    launcher: Arc<dyn PickerLauncher>,
    grants: Arc<dyn GrantStore>,
    provider: Arc<dyn DocumentProvider>,
    options: BrokerOptions,
    pending: PendingSlot,
    next_request_id: AtomicU64,
}

impl StorageAccessBroker {
    pub fn new(
        launcher: Arc<dyn PickerLauncher>,
        grants: Arc<dyn GrantStore>,
        provider: Arc<dyn DocumentProvider>,
        options: BrokerOptions,
    ) -> Self {
        Self {
            launcher,
            grants,
            provider,
            options,
            pending: PendingSlot::default(),
            next_request_id: AtomicU64::new(1),
        }
    }

    /// Asks the user for a directory through the platform picker.
    ///
    /// Resolves once the user answers: `Ok(Some(handle))` on approval (with a
    /// persisted read grant), `Ok(None)` on cancellation. There is no timeout.
    pub async fn request_directory_access(&self) -> AccessOutcome {
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let receiver = self.pending.issue(id, self.options.pending_policy)?;

        info!("Access request #{} issued", id);

        if let Err(e) = self
            .launcher
            .launch(REQUEST_CODE_OPEN_DOCUMENT_TREE, self.picker_intent())
        {
            self.pending.take_if(id);
            error!("Failed to launch directory picker for request #{}: {}", id, e);
            return Err(BrokerError::from(e));
        }

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Access request #{} lost its continuation", id);
                Err(BrokerError::RequestSuperseded)
            }
        }
    }

    /// Delivers the platform's answer to a picker launch.
    ///
    /// Returns `false` for results that belong to some other request code.
    /// Otherwise the pending slot is cleared whatever the outcome.
    pub fn on_activity_result(&self, result: ActivityResult) -> bool {
        if result.request_code != REQUEST_CODE_OPEN_DOCUMENT_TREE {
            debug!("Ignoring activity result for request code {}", result.request_code);
            return false;
        }

        let outcome = self.resolve_activity_result(result);

        match self.pending.take() {
            Some(pending) => {
                info!(
                    "Access request #{} completed: {}",
                    pending.id(),
                    describe(&outcome)
                );
                pending.complete(outcome);
            }
            None => warn!("Picker answered with no access request pending"),
        }

        true
    }

    pub fn is_request_pending(&self) -> bool {
        self.pending.pending_id().is_some()
    }

    /// Lists the regular files directly beneath `uri`.
    ///
    /// Anything that goes wrong after the argument check (unparseable
    /// handle, missing grant, I/O failure) is logged and yields an empty list.
    pub fn list_files(&self, uri: Option<&str>) -> Result<Vec<String>, BrokerError> {
        let uri = uri.ok_or(BrokerError::MissingHandle)?;

        let files = uri
            .parse::<DirectoryHandle>()
            .map_err(EnumerationError::from)
            .and_then(|handle| self.enumerate(&handle));

        match files {
            Ok(files) => Ok(files.iter().map(FileRef::to_string).collect()),
            Err(e) => {
                warn!("Listing {} failed, returning no files: {}", uri, e);
                Ok(Vec::new())
            }
        }
    }

    /// Typed enumeration: same listing as `list_files`, with the failure kept.
    pub fn enumerate(&self, handle: &DirectoryHandle) -> Result<Vec<FileRef>, EnumerationError> {
        if handle.authority() != self.provider.authority() {
            return Err(ProviderError::UnknownAuthority(handle.authority().to_string()).into());
        }

        if !self.grants.is_granted(handle, GrantMode::Read) {
            return Err(EnumerationError::NotGranted(handle.to_string()));
        }

        let files: Vec<FileRef> = self
            .provider
            .list_children(handle.tree_id())?
            .into_iter()
            .filter(DocumentEntry::is_file)
            .map(|entry| handle.document(entry.id))
            .collect();

        debug!("Enumerated {} - {} files", handle, files.len());
        Ok(files)
    }

    fn picker_intent(&self) -> PickerIntent {
        let initial_location = if self.options.supports_initial_hint {
            self.options.initial_location.clone()
        } else {
            None
        };

        PickerIntent {
            grant_read: true,
            grant_persistable: true,
            initial_location,
        }
    }

    fn resolve_activity_result(&self, result: ActivityResult) -> AccessOutcome {
        match (result.result_code, result.data) {
            (ResultCode::Ok, Some(data)) => match data.handle {
                Some(handle) => {
                    self.grants.take_persistable(&handle, GrantMode::Read)?;
                    Ok(Some(handle))
                }
                None => Err(BrokerError::NoHandleReturned),
            },
            _ => Ok(None),
        }
    }
}

fn describe(outcome: &AccessOutcome) -> String {
    match outcome {
        Ok(Some(handle)) => format!("granted {}", handle),
        Ok(None) => "cancelled".to_string(),
        Err(e) => format!("failed ({})", e),
    }
}
