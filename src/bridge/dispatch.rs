//! Method dispatch
//!
//! Routes decoded method calls to the storage access broker and turns the
//! outcome into a [`MethodReply`].

use log::{debug, info};
use serde_json::Value;

use crate::bridge::method::{
    ARG_URI, METHOD_LIST_FILES, METHOD_OPEN_DOCUMENT_TREE, MethodCall, MethodReply,
};
use crate::broker::StorageAccessBroker;
use crate::error::handlers::{bridge_error_code, broker_error_code};
use crate::error::{BridgeError, BrokerError};

/// Dispatches a method call to its handler.
///
/// `openDocumentTree` suspends until the user answers the picker; callers
/// that must stay responsive run this on its own task.
pub async fn handle_method_call(broker: &StorageAccessBroker, call: MethodCall) -> MethodReply {
    match call.method.as_str() {
        METHOD_OPEN_DOCUMENT_TREE => handle_open_document_tree(broker, call.id).await,
        METHOD_LIST_FILES => handle_list_files(broker, &call),
        other => {
            info!("Method {} is not implemented", other);
            MethodReply::NotImplemented { id: call.id }
        }
    }
}

/// Reply for a line that could not be decoded into a call.
pub fn bad_request_reply(err: &BridgeError) -> MethodReply {
    MethodReply::error(0, bridge_error_code(err), &err.to_string())
}

async fn handle_open_document_tree(broker: &StorageAccessBroker, id: u64) -> MethodReply {
    match broker.request_directory_access().await {
        Ok(Some(handle)) => MethodReply::success(id, Value::String(handle.to_string())),
        Ok(None) => MethodReply::success(id, Value::Null),
        Err(e) => error_reply(id, &e),
    }
}

fn handle_list_files(broker: &StorageAccessBroker, call: &MethodCall) -> MethodReply {
    match broker.list_files(call.argument_str(ARG_URI)) {
        Ok(files) => {
            debug!("listFiles #{} returned {} entries", call.id, files.len());
            MethodReply::success(
                call.id,
                Value::Array(files.into_iter().map(Value::String).collect()),
            )
        }
        Err(e) => error_reply(call.id, &e),
    }
}

fn error_reply(id: u64, err: &BrokerError) -> MethodReply {
    MethodReply::error(id, broker_error_code(err), &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerOptions;
    use crate::handle::DirectoryHandle;
    use crate::platform::{
        ActivityResult, ChannelPickerLauncher, GrantMode, GrantStore, InMemoryGrantStore,
        LocalDocumentProvider, REQUEST_CODE_OPEN_DOCUMENT_TREE,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn call(id: u64, method: &str, arguments: Option<Value>) -> MethodCall {
        MethodCall {
            id,
            method: method.to_string(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_list_files_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        let mut volumes = HashMap::new();
        volumes.insert("primary".to_string(), temp_dir.path().to_path_buf());

        let (launcher, _launches) = ChannelPickerLauncher::new();
        let grants = Arc::new(InMemoryGrantStore::new());
        let broker = StorageAccessBroker::new(
            Arc::new(launcher),
            grants.clone(),
            Arc::new(LocalDocumentProvider::new("local.documents", volumes)),
            BrokerOptions::default(),
        );

        let root = DirectoryHandle::new("local.documents", "primary:".parse().unwrap());
        grants.take_persistable(&root, GrantMode::Read).unwrap();

        let reply = handle_method_call(
            &broker,
            call(1, "listFiles", Some(json!({"uri": root.to_string()}))),
        )
        .await;
        assert_eq!(
            reply,
            MethodReply::success(
                1,
                json!(["content://local.documents/tree/primary%3A/document/primary%3Aa.jpg"])
            )
        );

        let reply = handle_method_call(&broker, call(2, "listFiles", None)).await;
        assert_eq!(reply, MethodReply::error(2, "INVALID_URI", "URI is null"));

        let reply = handle_method_call(
            &broker,
            call(3, "listFiles", Some(json!({"uri": "garbage"}))),
        )
        .await;
        assert_eq!(reply, MethodReply::success(3, json!([])));
    }

    #[tokio::test]
    async fn test_open_document_tree_dispatch() {
        let (launcher, mut launches) = ChannelPickerLauncher::new();
        let broker = Arc::new(StorageAccessBroker::new(
            Arc::new(launcher),
            Arc::new(InMemoryGrantStore::new()),
            Arc::new(LocalDocumentProvider::new("local.documents", HashMap::new())),
            BrokerOptions::default(),
        ));

        let task = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move {
                handle_method_call(&broker, call(5, "openDocumentTree", None)).await
            })
        };

        launches.recv().await.unwrap();
        broker.on_activity_result(ActivityResult::approved_without_handle(
            REQUEST_CODE_OPEN_DOCUMENT_TREE,
        ));

        assert_eq!(
            task.await.unwrap(),
            MethodReply::error(5, "NO_URI", "No URI returned")
        );
    }

    #[tokio::test]
    async fn test_unknown_method_is_not_implemented() {
        let (launcher, _launches) = ChannelPickerLauncher::new();
        let broker = StorageAccessBroker::new(
            Arc::new(launcher),
            Arc::new(InMemoryGrantStore::new()),
            Arc::new(LocalDocumentProvider::new("local.documents", HashMap::new())),
            BrokerOptions::default(),
        );

        let reply = handle_method_call(&broker, call(8, "deleteFile", None)).await;
        assert_eq!(reply, MethodReply::NotImplemented { id: 8 });
    }

    #[test]
    fn test_bad_request_reply() {
        let reply = bad_request_reply(&BridgeError::EmptyMessage);
        assert_eq!(reply, MethodReply::error(0, "BAD_REQUEST", "Empty message"));
    }
}
