//! Error handlers
//!
//! Maps domain errors onto the error codes the method-call bridge reports.

use crate::error::types::{BridgeError, BrokerError, SafBrokerError};
use log::error;

pub const CODE_INVALID_URI: &str = "INVALID_URI";
pub const CODE_NO_URI: &str = "NO_URI";
pub const CODE_ALREADY_ACTIVE: &str = "ALREADY_ACTIVE";
pub const CODE_REQUEST_SUPERSEDED: &str = "REQUEST_SUPERSEDED";
pub const CODE_PICKER_UNAVAILABLE: &str = "PICKER_UNAVAILABLE";
pub const CODE_GRANT_FAILED: &str = "GRANT_FAILED";
pub const CODE_BAD_REQUEST: &str = "BAD_REQUEST";

/// Handle a broker error that has no caller to report to
pub fn handle_error(err: &SafBrokerError) {
    error!("Storage broker error: {}", err);
}

/// Convert a broker error to its bridge error code
pub fn broker_error_code(err: &BrokerError) -> &'static str {
    match err {
        BrokerError::MissingHandle => CODE_INVALID_URI,
        BrokerError::NoHandleReturned => CODE_NO_URI,
        BrokerError::RequestPending => CODE_ALREADY_ACTIVE,
        BrokerError::RequestSuperseded => CODE_REQUEST_SUPERSEDED,
        BrokerError::PickerUnavailable(_) => CODE_PICKER_UNAVAILABLE,
        BrokerError::GrantFailed(_) => CODE_GRANT_FAILED,
    }
}

/// Convert a bridge decoding error to its bridge error code
pub fn bridge_error_code(err: &BridgeError) -> &'static str {
    match err {
        BridgeError::EmptyMessage
        | BridgeError::MessageTooLong(_)
        | BridgeError::InvalidUtf8(_)
        | BridgeError::Malformed(_) => CODE_BAD_REQUEST,
    }
}
