//! Error types
//!
//! Defines domain-specific error types for each module of the broker.

use std::fmt;
use std::io;

/// Capability string parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    Empty,
    InvalidScheme(String),
    MissingAuthority(String),
    NotATree(String),
    NotADocument(String),
    MalformedDocumentId(String),
    InvalidEncoding(String),
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleError::Empty => write!(f, "Empty handle"),
            HandleError::InvalidScheme(s) => write!(f, "Not a content URI: {}", s),
            HandleError::MissingAuthority(s) => write!(f, "Missing authority: {}", s),
            HandleError::NotATree(s) => write!(f, "Not a tree URI: {}", s),
            HandleError::NotADocument(s) => write!(f, "Not a document URI: {}", s),
            HandleError::MalformedDocumentId(s) => write!(f, "Malformed document id: {}", s),
            HandleError::InvalidEncoding(s) => write!(f, "Invalid percent-encoding: {}", s),
        }
    }
}

impl std::error::Error for HandleError {}

/// Document provider errors
#[derive(Debug)]
pub enum ProviderError {
    UnknownAuthority(String),
    UnknownVolume(String),
    DirectoryNotFound(String),
    NotADirectory(String),
    PathTraversal(String),
    IoError(io::Error),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::UnknownAuthority(a) => write!(f, "Unknown authority: {}", a),
            ProviderError::UnknownVolume(v) => write!(f, "Unknown volume: {}", v),
            ProviderError::DirectoryNotFound(d) => write!(f, "Directory not found: {}", d),
            ProviderError::NotADirectory(d) => write!(f, "Not a directory: {}", d),
            ProviderError::PathTraversal(d) => write!(f, "Path traversal attempt: {}", d),
            ProviderError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<io::Error> for ProviderError {
    fn from(error: io::Error) -> Self {
        ProviderError::IoError(error)
    }
}

/// Grant store errors
#[derive(Debug)]
pub enum GrantError {
    IoError(io::Error),
    Corrupt(String),
}

impl fmt::Display for GrantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantError::IoError(e) => write!(f, "IO error: {}", e),
            GrantError::Corrupt(msg) => write!(f, "Grant store is corrupt: {}", msg),
        }
    }
}

impl std::error::Error for GrantError {}

impl From<io::Error> for GrantError {
    fn from(error: io::Error) -> Self {
        GrantError::IoError(error)
    }
}

impl From<serde_json::Error> for GrantError {
    fn from(error: serde_json::Error) -> Self {
        GrantError::Corrupt(error.to_string())
    }
}

/// Picker launch errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    ChannelClosed,
}

impl fmt::Display for PickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerError::ChannelClosed => write!(f, "Picker channel closed"),
        }
    }
}

impl std::error::Error for PickerError {}

/// Errors raised while enumerating a directory handle.
///
/// `list_files` swallows these; `enumerate` hands them to the caller.
#[derive(Debug)]
pub enum EnumerationError {
    Handle(HandleError),
    NotGranted(String),
    Provider(ProviderError),
}

impl fmt::Display for EnumerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumerationError::Handle(e) => write!(f, "Invalid handle: {}", e),
            EnumerationError::NotGranted(uri) => write!(f, "No read grant for {}", uri),
            EnumerationError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for EnumerationError {}

impl From<HandleError> for EnumerationError {
    fn from(error: HandleError) -> Self {
        EnumerationError::Handle(error)
    }
}

impl From<ProviderError> for EnumerationError {
    fn from(error: ProviderError) -> Self {
        EnumerationError::Provider(error)
    }
}

/// Broker operation errors surfaced to the bridge
#[derive(Debug)]
pub enum BrokerError {
    MissingHandle,
    NoHandleReturned,
    RequestPending,
    RequestSuperseded,
    PickerUnavailable(PickerError),
    GrantFailed(GrantError),
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::MissingHandle => write!(f, "URI is null"),
            BrokerError::NoHandleReturned => write!(f, "No URI returned"),
            BrokerError::RequestPending => {
                write!(f, "A directory access request is already pending")
            }
            BrokerError::RequestSuperseded => {
                write!(f, "Request was superseded by a newer request")
            }
            BrokerError::PickerUnavailable(e) => write!(f, "{}", e),
            BrokerError::GrantFailed(e) => write!(f, "Failed to persist grant: {}", e),
        }
    }
}

impl std::error::Error for BrokerError {}

impl From<PickerError> for BrokerError {
    fn from(error: PickerError) -> Self {
        BrokerError::PickerUnavailable(error)
    }
}

impl From<GrantError> for BrokerError {
    fn from(error: GrantError) -> Self {
        BrokerError::GrantFailed(error)
    }
}

/// Method-call bridge errors
#[derive(Debug)]
pub enum BridgeError {
    EmptyMessage,
    MessageTooLong(usize),
    /// Byte offset of the first invalid sequence
    InvalidUtf8(usize),
    Malformed(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::EmptyMessage => write!(f, "Empty message"),
            BridgeError::MessageTooLong(len) => write!(f, "Message too long ({} bytes)", len),
            BridgeError::InvalidUtf8(at) => {
                write!(f, "Message is not valid UTF-8 (byte {})", at)
            }
            BridgeError::Malformed(msg) => write!(f, "Malformed method call: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        BridgeError::Malformed(error.to_string())
    }
}

/// General broker error that encompasses all error types
#[derive(Debug)]
pub enum SafBrokerError {
    Grant(GrantError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for SafBrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafBrokerError::Grant(e) => write!(f, "Grant error: {}", e),
            SafBrokerError::Config(e) => write!(f, "Configuration error: {}", e),
            SafBrokerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SafBrokerError {}

impl From<GrantError> for SafBrokerError {
    fn from(error: GrantError) -> Self {
        SafBrokerError::Grant(error)
    }
}

impl From<config::ConfigError> for SafBrokerError {
    fn from(error: config::ConfigError) -> Self {
        SafBrokerError::Config(error)
    }
}

impl From<io::Error> for SafBrokerError {
    fn from(error: io::Error) -> Self {
        SafBrokerError::IoError(error)
    }
}
