//! Document identifiers
//!
//! A document id names a location inside a storage volume as
//! `<volume>:<relative path>`, e.g. `primary:Android/media`.

use std::fmt;
use std::str::FromStr;

use crate::error::HandleError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    volume: String,
    path: String,
}

impl DocumentId {
    pub fn new(volume: &str, path: &str) -> Result<Self, HandleError> {
        let volume = volume.trim();
        if volume.is_empty() || volume.contains('/') {
            return Err(HandleError::MalformedDocumentId(format!("{}:{}", volume, path)));
        }

        let path = path.trim_matches('/');
        if path.split('/').any(|segment| segment.is_empty() && !path.is_empty()) {
            return Err(HandleError::MalformedDocumentId(format!("{}:{}", volume, path)));
        }

        Ok(Self {
            volume: volume.to_string(),
            path: path.to_string(),
        })
    }

    pub fn volume(&self) -> &str {
        &self.volume
    }

    /// Path relative to the volume root; empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the id of a direct child named `name`.
    pub fn child(&self, name: &str) -> DocumentId {
        let path = if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        };
        DocumentId {
            volume: self.volume.clone(),
            path,
        }
    }
}

impl FromStr for DocumentId {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((volume, path)) => DocumentId::new(volume, path),
            None => Err(HandleError::MalformedDocumentId(s.to_string())),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.volume, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_volume_and_path() {
        let id: DocumentId = "primary:Android/media".parse().unwrap();
        assert_eq!(id.volume(), "primary");
        assert_eq!(id.path(), "Android/media");
        assert_eq!(id.to_string(), "primary:Android/media");
    }

    #[test]
    fn test_volume_root() {
        let id: DocumentId = "primary:".parse().unwrap();
        assert_eq!(id.path(), "");
        assert_eq!(id.child("DCIM").to_string(), "primary:DCIM");
    }

    #[test]
    fn test_rejects_missing_separator_and_volume() {
        assert!("primary".parse::<DocumentId>().is_err());
        assert!(":Android".parse::<DocumentId>().is_err());
        assert!("primary:a//b".parse::<DocumentId>().is_err());
    }
}
