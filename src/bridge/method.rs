//! Module `method`
//!
//! Wire types of the method-call bridge: one JSON object per line in each
//! direction, correlated by `id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

pub const METHOD_OPEN_DOCUMENT_TREE: &str = "openDocumentTree";
pub const METHOD_LIST_FILES: &str = "listFiles";
pub const ARG_URI: &str = "uri";

/// A method call received from the host application.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MethodCall {
    #[serde(default)]
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl MethodCall {
    /// String argument `key`; `None` when absent, null or not a string.
    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments
            .as_ref()
            .and_then(|args| args.get(key))
            .and_then(Value::as_str)
    }
}

/// The reply sent back for a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodReply {
    Success {
        id: u64,
        result: Value,
    },
    Error {
        id: u64,
        code: String,
        message: String,
        details: Option<Value>,
    },
    NotImplemented {
        id: u64,
    },
}

impl MethodReply {
    pub fn success(id: u64, result: Value) -> Self {
        MethodReply::Success { id, result }
    }

    pub fn error(id: u64, code: &str, message: &str) -> Self {
        MethodReply::Error {
            id,
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            MethodReply::Success { id, .. }
            | MethodReply::Error { id, .. }
            | MethodReply::NotImplemented { id } => *id,
        }
    }

    /// Serialises the reply as one wire line, newline included.
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            // Only reachable with non-string map keys, which replies never carry
            Err(e) => format!(
                "{{\"id\":{},\"status\":\"error\",\"code\":\"INTERNAL\",\"message\":\"{}\",\"details\":null}}\n",
                self.id(),
                e.to_string().replace('"', "'")
            ),
        }
    }
}

/// Parses one received line into a method call.
pub fn decode_call(line: &str, max_length: usize) -> Result<MethodCall, BridgeError> {
    if line.len() > max_length {
        return Err(BridgeError::MessageTooLong(line.len()));
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::EmptyMessage);
    }

    let call: MethodCall = serde_json::from_str(trimmed)?;
    if call.method.is_empty() {
        return Err(BridgeError::Malformed("method name is empty".into()));
    }

    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_list_files_call() {
        let call = decode_call(
            r#"{"id": 3, "method": "listFiles", "arguments": {"uri": "content://a/tree/x%3A"}}"#,
            1024,
        )
        .unwrap();
        assert_eq!(call.id, 3);
        assert_eq!(call.method, METHOD_LIST_FILES);
        assert_eq!(call.argument_str(ARG_URI), Some("content://a/tree/x%3A"));
    }

    #[test]
    fn test_argument_str_treats_null_and_numbers_as_absent() {
        let call = decode_call(r#"{"method": "listFiles", "arguments": {"uri": null}}"#, 1024)
            .unwrap();
        assert_eq!(call.argument_str(ARG_URI), None);

        let call = decode_call(r#"{"method": "listFiles", "arguments": {"uri": 5}}"#, 1024)
            .unwrap();
        assert_eq!(call.argument_str(ARG_URI), None);

        let call = decode_call(r#"{"method": "openDocumentTree"}"#, 1024).unwrap();
        assert_eq!(call.id, 0);
        assert_eq!(call.argument_str(ARG_URI), None);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_call("   ", 1024), Err(BridgeError::EmptyMessage)));
        assert!(matches!(
            decode_call("LIST", 1024),
            Err(BridgeError::Malformed(_))
        ));
        assert!(matches!(
            decode_call(r#"{"method": ""}"#, 1024),
            Err(BridgeError::Malformed(_))
        ));
        assert!(matches!(
            decode_call(&"x".repeat(20), 10),
            Err(BridgeError::MessageTooLong(20))
        ));
    }

    #[test]
    fn test_reply_wire_shape() {
        let reply = MethodReply::success(1, json!(null));
        let value: Value = serde_json::from_str(&reply.to_line()).unwrap();
        assert_eq!(value, json!({"id": 1, "status": "success", "result": null}));

        let reply = MethodReply::error(2, "INVALID_URI", "URI is null");
        let value: Value = serde_json::from_str(&reply.to_line()).unwrap();
        assert_eq!(
            value,
            json!({"id": 2, "status": "error", "code": "INVALID_URI", "message": "URI is null", "details": null})
        );

        let reply = MethodReply::NotImplemented { id: 9 };
        assert_eq!(reply.to_line(), "{\"status\":\"notImplemented\",\"id\":9}\n");
    }
}
