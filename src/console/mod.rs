//! Console picker
//!
//! Plays the directory-picker UI at the operator's terminal: each picker
//! launch is shown as a prompt, and the typed answer goes back to the broker
//! as an activity result.

use log::{info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::broker::StorageAccessBroker;
use crate::handle::{DirectoryHandle, DocumentId};
use crate::platform::{ActivityResult, PickerLaunch};

const DEFAULT_VOLUME: &str = "primary";
const NO_HANDLE_ANSWER: &str = "!";
const CANCEL_ANSWER: &str = "cancel";

/// Turns one line typed by the operator into the picker's answer.
///
/// Empty or `cancel` cancels, `!` approves without a handle, anything else
/// names the approved directory as `volume:path` or a path on `primary`.
pub fn parse_selection(input: &str, request_code: i32, authority: &str) -> ActivityResult {
    let input = input.trim();

    if input.is_empty() || input.eq_ignore_ascii_case(CANCEL_ANSWER) {
        return ActivityResult::canceled(request_code);
    }

    if input == NO_HANDLE_ANSWER {
        return ActivityResult::approved_without_handle(request_code);
    }

    let parsed = if input.contains(':') {
        input.parse::<DocumentId>()
    } else {
        DocumentId::new(DEFAULT_VOLUME, input)
    };

    match parsed {
        Ok(id) => ActivityResult::approved(request_code, DirectoryHandle::new(authority, id)),
        Err(e) => {
            warn!("Unusable picker selection '{}': {}", input, e);
            ActivityResult::canceled(request_code)
        }
    }
}

/// Serves picker launches from stdin until the launch channel closes.
pub async fn run_console_picker(
    broker: Arc<StorageAccessBroker>,
    launches: UnboundedReceiver<PickerLaunch>,
    authority: String,
) {
    serve_picker(
        broker,
        launches,
        &authority,
        tokio::io::stdin(),
        tokio::io::stdout(),
    )
    .await;
}

/// Answers each launch with one line of `input`, prompting on `output`.
/// Once `input` is exhausted every further launch is cancelled.
pub async fn serve_picker<R, W>(
    broker: Arc<StorageAccessBroker>,
    mut launches: UnboundedReceiver<PickerLaunch>,
    authority: &str,
    input: R,
    mut output: W,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut input = BufReader::new(input).lines();

    while let Some(launch) = launches.recv().await {
        let hint = launch
            .intent
            .initial_location
            .as_deref()
            .unwrap_or("(default location)");

        let prompt = format!(
            "\n[picker] Directory access requested (start: {})\n\
             [picker] Enter volume:path or a path on '{}', '!' for no handle, empty to cancel: ",
            hint, DEFAULT_VOLUME
        );
        if output.write_all(prompt.as_bytes()).await.is_err() || output.flush().await.is_err() {
            warn!("Console unavailable; cancelling picker request");
        }

        let answer = match input.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                warn!("Console input closed; cancelling picker request");
                String::new()
            }
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                String::new()
            }
        };

        let result = parse_selection(&answer, launch.request_code, authority);
        info!("Picker answered {:?}", result.result_code);
        broker.on_activity_result(result);
    }

    info!("Picker channel closed; console picker stopped");
}
