use log::{error, info, warn};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};

use crate::bridge::{MethodReply, bad_request_reply, decode_call, handle_method_call};
use crate::broker::StorageAccessBroker;
use crate::config::StartupConfig;
use crate::error::BridgeError;
use crate::server::framing::{LineRead, read_bounded_line};
use crate::server::session::Session;

type SessionRegistry = Arc<Mutex<HashMap<SocketAddr, Session>>>;

/// Serves the method-call bridge to host applications over TCP.
pub struct Server {
    sessions: SessionRegistry,
    broker: Arc<StorageAccessBroker>,
    listener: TcpListener,
    config: Arc<StartupConfig>,
}

impl Server {
    pub async fn bind(config: StartupConfig, broker: Arc<StorageAccessBroker>) -> io::Result<Self> {
        let socket = config.bridge_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        info!("Bridge bound to {}", listener.local_addr()?);

        Ok(Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            broker,
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Serving channel {} (max {} connections)",
            self.config.channel, self.config.max_connections
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let sessions = Arc::clone(&self.sessions);
                    let broker = Arc::clone(&self.broker);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each host so the accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, addr, Arc::clone(&sessions), broker, config)
                                .await
                        {
                            warn!("Connection {} ended with error: {}", addr, e);
                        }

                        if let Some(session) = sessions.lock().await.remove(&addr) {
                            info!(
                                "Host {} disconnected after {} call(s) in {:?}",
                                session.addr(),
                                session.calls(),
                                session.connected_for()
                            );
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Registers a host, greets it, then serves its calls until it disconnects.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: SessionRegistry,
    broker: Arc<StorageAccessBroker>,
    config: Arc<StartupConfig>,
) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();

    {
        let mut registry = sessions.lock().await;
        if registry.len() >= config.max_connections {
            warn!("Refusing {}: {} connections open", addr, registry.len());
            write_half
                .write_all(b"{\"error\":\"too many connections\"}\n")
                .await?;
            return Ok(());
        }
        registry.insert(addr, Session::new(addr));
        info!(
            "Host connected: {} ({}/{} connections)",
            addr,
            registry.len(),
            config.max_connections
        );
    }

    let greeting = format!("{}\n", serde_json::json!({ "channel": config.channel }));
    write_half.write_all(greeting.as_bytes()).await?;
    write_half.flush().await?;

    // Calls complete out of order; one writer keeps reply lines whole
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<MethodReply>();
    tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            if let Err(e) = write_half.write_all(reply.to_line().as_bytes()).await {
                warn!("Failed to send reply #{} to {}: {}", reply.id(), addr, e);
                break;
            }
        }
    });

    read_calls(read_half, addr, &sessions, &broker, &config, reply_tx).await
}

async fn read_calls(
    read_half: OwnedReadHalf,
    addr: SocketAddr,
    sessions: &SessionRegistry,
    broker: &Arc<StorageAccessBroker>,
    config: &StartupConfig,
    reply_tx: mpsc::UnboundedSender<MethodReply>,
) -> io::Result<()> {
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();

    loop {
        match read_bounded_line(&mut reader, &mut buf, config.max_message_length).await? {
            LineRead::Eof => {
                info!("Connection closed by host {}", addr);
                return Ok(());
            }
            LineRead::TooLong(len) => {
                let e = BridgeError::MessageTooLong(len);
                warn!("Bad request from {}: {}", addr, e);
                let _ = reply_tx.send(bad_request_reply(&e));
                continue;
            }
            LineRead::Line => {}
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                let e = BridgeError::InvalidUtf8(e.valid_up_to());
                warn!("Bad request from {}: {}", addr, e);
                let _ = reply_tx.send(bad_request_reply(&e));
                continue;
            }
        };

        let call = match decode_call(line, config.max_message_length) {
            Ok(call) => call,
            Err(BridgeError::EmptyMessage) => continue,
            Err(e) => {
                warn!("Bad request from {}: {}", addr, e);
                let _ = reply_tx.send(bad_request_reply(&e));
                continue;
            }
        };

        info!("Received from {}: {} #{}", addr, call.method, call.id);

        if let Some(session) = sessions.lock().await.get_mut(&addr) {
            session.record_call();
        }

        let broker = Arc::clone(broker);
        let reply_tx = reply_tx.clone();
        tokio::spawn(async move {
            let reply = handle_method_call(&broker, call).await;
            let _ = reply_tx.send(reply);
        });
    }
}
