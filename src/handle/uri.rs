//! Capability URIs
//!
//! Directory handles and file references travel across the bridge as
//! `content://` strings. Document ids are percent-encoded into a single
//! path segment, so `primary:Android/media` becomes `primary%3AAndroid%2Fmedia`.

use std::fmt;
use std::str::FromStr;

use crate::error::HandleError;
use crate::handle::DocumentId;

const CONTENT_SCHEME: &str = "content://";
const TREE_SEGMENT: &str = "tree";
const DOCUMENT_SEGMENT: &str = "document";

/// A user-approved directory tree.
///
/// Only the platform picker creates these; the broker never fabricates one
/// from a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryHandle {
    authority: String,
    tree_id: DocumentId,
}

impl DirectoryHandle {
    pub fn new(authority: &str, tree_id: DocumentId) -> Self {
        Self {
            authority: authority.to_string(),
            tree_id,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn tree_id(&self) -> &DocumentId {
        &self.tree_id
    }

    /// Reference to a document inside this tree.
    pub fn document(&self, document_id: DocumentId) -> FileRef {
        FileRef {
            tree: self.clone(),
            document_id,
        }
    }
}

impl FromStr for DirectoryHandle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (authority, segments) = split_content_uri(s)?;
        match segments.as_slice() {
            [TREE_SEGMENT, tree_id] => Ok(DirectoryHandle::new(authority, decode_id(tree_id)?)),
            _ => Err(HandleError::NotATree(s.to_string())),
        }
    }
}

impl fmt::Display for DirectoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}/{}",
            CONTENT_SCHEME,
            self.authority,
            TREE_SEGMENT,
            encode_id(&self.tree_id)
        )
    }
}

/// A file produced by enumerating a [`DirectoryHandle`].
///
/// Carries its tree so reads stay scoped to the grant that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    tree: DirectoryHandle,
    document_id: DocumentId,
}

impl FileRef {
    pub fn tree(&self) -> &DirectoryHandle {
        &self.tree
    }
}

impl FromStr for FileRef {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (authority, segments) = split_content_uri(s)?;
        match segments.as_slice() {
            [TREE_SEGMENT, tree_id, DOCUMENT_SEGMENT, document_id] => Ok(FileRef {
                tree: DirectoryHandle::new(authority, decode_id(tree_id)?),
                document_id: decode_id(document_id)?,
            }),
            _ => Err(HandleError::NotADocument(s.to_string())),
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tree,
            DOCUMENT_SEGMENT,
            encode_id(&self.document_id)
        )
    }
}

/// Builds a plain document URI, used for picker location hints.
pub fn document_uri(authority: &str, document_id: &DocumentId) -> String {
    format!(
        "{}{}/{}/{}",
        CONTENT_SCHEME,
        authority,
        DOCUMENT_SEGMENT,
        encode_id(document_id)
    )
}

fn split_content_uri(s: &str) -> Result<(&str, Vec<&str>), HandleError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(HandleError::Empty);
    }

    let rest = s
        .strip_prefix(CONTENT_SCHEME)
        .ok_or_else(|| HandleError::InvalidScheme(s.to_string()))?;

    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    if authority.is_empty() {
        return Err(HandleError::MissingAuthority(s.to_string()));
    }

    Ok((authority, path.split('/').collect()))
}

fn encode_id(id: &DocumentId) -> String {
    urlencoding::encode(&id.to_string()).into_owned()
}

fn decode_id(segment: &str) -> Result<DocumentId, HandleError> {
    let decoded = urlencoding::decode(segment)
        .map_err(|_| HandleError::InvalidEncoding(segment.to_string()))?;
    decoded.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: &str = "com.android.externalstorage.documents";

    #[test]
    fn test_tree_handle_string_form() {
        let handle = DirectoryHandle::new(AUTHORITY, "primary:Android/media".parse().unwrap());
        assert_eq!(
            handle.to_string(),
            "content://com.android.externalstorage.documents/tree/primary%3AAndroid%2Fmedia"
        );
        let parsed: DirectoryHandle = handle.to_string().parse().unwrap();
        assert_eq!(parsed, handle);
    }

    #[test]
    fn test_file_ref_string_form() {
        let handle = DirectoryHandle::new(AUTHORITY, "primary:Statuses".parse().unwrap());
        let file = handle.document(handle.tree_id().child("a.jpg"));
        assert_eq!(
            file.to_string(),
            "content://com.android.externalstorage.documents/tree/primary%3AStatuses/document/primary%3AStatuses%2Fa.jpg"
        );
        let parsed: FileRef = file.to_string().parse().unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!("".parse::<DirectoryHandle>(), Err(HandleError::Empty));
        assert!(matches!(
            "not a uri at all".parse::<DirectoryHandle>(),
            Err(HandleError::InvalidScheme(_))
        ));
        assert!(matches!(
            "content:///tree/primary%3A".parse::<DirectoryHandle>(),
            Err(HandleError::MissingAuthority(_))
        ));
        assert!(matches!(
            "content://auth/document/primary%3A".parse::<DirectoryHandle>(),
            Err(HandleError::NotATree(_))
        ));
        assert!(matches!(
            "content://auth/tree/%FF%FE".parse::<DirectoryHandle>(),
            Err(HandleError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_tree_handle_is_not_a_file_ref() {
        assert!(matches!(
            "content://auth/tree/primary%3A".parse::<FileRef>(),
            Err(HandleError::NotADocument(_))
        ));
    }

    #[test]
    fn test_document_uri_for_hint() {
        let id: DocumentId = "primary:Android/media/com.whatsapp/WhatsApp/Media/.Statuses"
            .parse()
            .unwrap();
        assert_eq!(
            document_uri(AUTHORITY, &id),
            "content://com.android.externalstorage.documents/document/primary%3AAndroid%2Fmedia%2Fcom.whatsapp%2FWhatsApp%2FMedia%2F.Statuses"
        );
    }
}
