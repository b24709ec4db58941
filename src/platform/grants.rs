//! Grant store
//!
//! Platform-managed permission storage. A grant taken here outlives the
//! request that created it; the file-backed store survives restarts.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::GrantError;
use crate::handle::DirectoryHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantMode {
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedGrant {
    pub uri: String,
    pub mode: GrantMode,
    pub granted_at: DateTime<Utc>,
}

pub trait GrantStore: Send + Sync {
    /// Persists `mode` access for `handle`. Idempotent.
    fn take_persistable(&self, handle: &DirectoryHandle, mode: GrantMode) -> Result<(), GrantError>;

    fn is_granted(&self, handle: &DirectoryHandle, mode: GrantMode) -> bool;

    fn grants(&self) -> Vec<PersistedGrant>;
}

/// Session-only grants.
#[derive(Default)]
pub struct InMemoryGrantStore {
    grants: Mutex<Vec<PersistedGrant>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrantStore for InMemoryGrantStore {
    fn take_persistable(&self, handle: &DirectoryHandle, mode: GrantMode) -> Result<(), GrantError> {
        let mut grants = lock(&self.grants);
        insert_grant(&mut grants, handle, mode);
        Ok(())
    }

    fn is_granted(&self, handle: &DirectoryHandle, mode: GrantMode) -> bool {
        contains_grant(&lock(&self.grants), handle, mode)
    }

    fn grants(&self) -> Vec<PersistedGrant> {
        lock(&self.grants).clone()
    }
}

/// Grants kept in a JSON file, rewritten whenever a new grant is taken.
pub struct FileGrantStore {
    path: PathBuf,
    grants: Mutex<Vec<PersistedGrant>>,
}

impl FileGrantStore {
    /// Opens the store, starting empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, GrantError> {
        let grants = if path.exists() {
            let contents = fs::read_to_string(path)?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Vec::new()
        };

        info!(
            "Loaded {} persisted grant(s) from {}",
            grants.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            grants: Mutex::new(grants),
        })
    }

    fn save(&self, grants: &[PersistedGrant]) -> Result<(), GrantError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename: the grants file is never observed half-written
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(grants)?)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("Saved {} grant(s) to {}", grants.len(), self.path.display());
        Ok(())
    }
}

impl GrantStore for FileGrantStore {
    fn take_persistable(&self, handle: &DirectoryHandle, mode: GrantMode) -> Result<(), GrantError> {
        let mut grants = lock(&self.grants);
        if contains_grant(&grants, handle, mode) {
            return Ok(());
        }

        let mut updated = grants.clone();
        insert_grant(&mut updated, handle, mode);
        self.save(&updated)?;
        *grants = updated;

        info!("Persisted {:?} grant for {}", mode, handle);
        Ok(())
    }

    fn is_granted(&self, handle: &DirectoryHandle, mode: GrantMode) -> bool {
        contains_grant(&lock(&self.grants), handle, mode)
    }

    fn grants(&self) -> Vec<PersistedGrant> {
        lock(&self.grants).clone()
    }
}

fn lock(grants: &Mutex<Vec<PersistedGrant>>) -> MutexGuard<'_, Vec<PersistedGrant>> {
    grants.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn contains_grant(grants: &[PersistedGrant], handle: &DirectoryHandle, mode: GrantMode) -> bool {
    let uri = handle.to_string();
    grants.iter().any(|g| g.uri == uri && g.mode == mode)
}

fn insert_grant(grants: &mut Vec<PersistedGrant>, handle: &DirectoryHandle, mode: GrantMode) {
    if contains_grant(grants, handle, mode) {
        return;
    }
    grants.push(PersistedGrant {
        uri: handle.to_string(),
        mode,
        granted_at: Utc::now(),
    });
}
