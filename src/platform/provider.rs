//! Document provider
//!
//! Resolves document ids to directories and enumerates their children. The
//! local provider serves configured storage volumes from the host filesystem.

use log::{debug, error, warn};
use std::collections::HashMap;
use std::fs::{self, DirEntry};
use std::path::{Component, Path, PathBuf};

use crate::error::ProviderError;
use crate::handle::DocumentId;

/// What a child document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    File,
    Directory,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub id: DocumentId,
    pub kind: DocumentKind,
}

impl DocumentEntry {
    pub fn is_file(&self) -> bool {
        self.kind == DocumentKind::File
    }
}

/// Platform-side document access.
pub trait DocumentProvider: Send + Sync {
    /// Authority this provider answers for in `content://` URIs.
    fn authority(&self) -> &str;

    /// Lists the immediate children of a directory document. Failing to read
    /// the directory fails the call; a child that can't be inspected is
    /// reported as `Other`.
    fn list_children(&self, directory: &DocumentId) -> Result<Vec<DocumentEntry>, ProviderError>;
}

/// Serves named volumes (`primary` -> `/srv/storage`) from the local disk.
pub struct LocalDocumentProvider {
    authority: String,
    volumes: HashMap<String, PathBuf>,
}

impl LocalDocumentProvider {
    pub fn new(authority: &str, volumes: HashMap<String, PathBuf>) -> Self {
        Self {
            authority: authority.to_string(),
            volumes,
        }
    }

    /// Resolves a document id to a real directory inside its volume.
    pub fn resolve_directory(&self, id: &DocumentId) -> Result<PathBuf, ProviderError> {
        let volume_root = self
            .volumes
            .get(id.volume())
            .ok_or_else(|| ProviderError::UnknownVolume(id.volume().to_string()))?;

        let relative = Path::new(id.path());
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ProviderError::PathTraversal(id.to_string()));
        }

        let real_path = volume_root.join(relative);
        if !real_path.exists() {
            return Err(ProviderError::DirectoryNotFound(id.to_string()));
        }
        if !real_path.is_dir() {
            return Err(ProviderError::NotADirectory(id.to_string()));
        }

        // Symlinks may still lead out of the volume
        let canonical = real_path.canonicalize()?;
        let root_canonical = volume_root.canonicalize()?;
        if !canonical.starts_with(&root_canonical) {
            return Err(ProviderError::PathTraversal(id.to_string()));
        }

        Ok(canonical)
    }
}

impl DocumentProvider for LocalDocumentProvider {
    fn authority(&self) -> &str {
        &self.authority
    }

    fn list_children(&self, directory: &DocumentId) -> Result<Vec<DocumentEntry>, ProviderError> {
        let real_path = self.resolve_directory(directory)?;

        let entries = fs::read_dir(&real_path).map_err(|e| {
            error!(
                "Failed to read directory {} (real: {}): {}",
                directory,
                real_path.display(),
                e
            );
            ProviderError::from(e)
        })?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!("Skipping non UTF-8 name {:?} in {}", raw, directory);
                    continue;
                }
            };

            children.push(DocumentEntry {
                id: directory.child(&name),
                kind: classify(&entry),
            });
        }

        children.sort_by(|a, b| a.id.path().cmp(b.id.path()));

        debug!(
            "Listed {} (real: {}) - {} children",
            directory,
            real_path.display(),
            children.len()
        );

        Ok(children)
    }
}

/// Classifies a child, following symlinks. Anything unreadable is `Other`.
fn classify(entry: &DirEntry) -> DocumentKind {
    let file_type = match entry.file_type() {
        Ok(file_type) => file_type,
        Err(e) => {
            warn!("Cannot inspect {}: {}", entry.path().display(), e);
            return DocumentKind::Other;
        }
    };

    let file_type = if file_type.is_symlink() {
        match fs::metadata(entry.path()) {
            Ok(metadata) => metadata.file_type(),
            Err(e) => {
                debug!("Unresolvable link {}: {}", entry.path().display(), e);
                return DocumentKind::Other;
            }
        }
    } else {
        file_type
    };

    if file_type.is_file() {
        DocumentKind::File
    } else if file_type.is_dir() {
        DocumentKind::Directory
    } else {
        DocumentKind::Other
    }
}
