//! saf-broker - Entry Point
//!
//! Scoped-storage access broker serving `openDocumentTree` and `listFiles`
//! to a host application over the method-call bridge.

use log::{info, warn};
use std::sync::Arc;

use saf_broker::StorageAccessBroker;
use saf_broker::config::BrokerConfig;
use saf_broker::console::run_console_picker;
use saf_broker::error::SafBrokerError;
use saf_broker::error::handlers::handle_error;
use saf_broker::platform::{ChannelPickerLauncher, FileGrantStore, LocalDocumentProvider};
use saf_broker::server::Server;
use saf_broker::utils::logging::setup_logging;

#[tokio::main]
async fn main() {
    setup_logging();

    info!("Launching storage access broker...");

    if let Err(e) = run().await {
        handle_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SafBrokerError> {
    let (startup, platform) = BrokerConfig::load()?.split();

    for (name, root) in &platform.volumes {
        if let Err(e) = std::fs::create_dir_all(root) {
            warn!("Failed to create volume '{}' at {}: {}", name, root, e);
        } else {
            info!("Volume '{}' served from {}", name, root);
        }
    }

    let grants = Arc::new(FileGrantStore::open(platform.grants_path())?);
    let provider = Arc::new(LocalDocumentProvider::new(
        &platform.authority,
        platform.volume_paths(),
    ));
    let (launcher, launches) = ChannelPickerLauncher::new();

    let broker = Arc::new(StorageAccessBroker::new(
        Arc::new(launcher),
        grants,
        provider,
        platform.broker_options(),
    ));

    tokio::spawn(run_console_picker(
        Arc::clone(&broker),
        launches,
        platform.authority.clone(),
    ));

    let server = Server::bind(startup, broker).await?;
    server.start().await;

    Ok(())
}
