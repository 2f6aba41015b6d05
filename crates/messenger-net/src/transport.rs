//! Connection task with tokio mpsc command/notification channels.
//!
//! One task owns the socket. Callers talk to it through a
//! [`TransportHandle`] (requests awaiting a correlated response) and receive
//! [`TransportNotification`]s (connection state and push events) in delivery
//! order.

use std::collections::HashMap;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use messenger_shared::constants::TRANSPORT_CHANNEL_CAPACITY;

use crate::error::{Result, TransportError};
use crate::frame::Frame;

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the connection task.
#[derive(Debug)]
pub enum TransportCommand {
    /// Send a named request and deliver the correlated response to `reply`.
    Request {
        name: String,
        payload: Value,
        reply: oneshot::Sender<Result<Value>>,
    },
    /// Close the connection and stop the task.
    Shutdown,
}

/// Notifications sent *from* the connection task to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportNotification {
    /// A connection was (re)established and the hello frame sent.
    Connected,
    /// A server push event.
    Event { name: String, payload: Value },
    /// The connection dropped. Pending requests have been failed.
    Disconnected { reason: String },
}

/// Identity presented in the hello frame.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    pub username: String,
    pub token: Option<String>,
}

/// Cloneable sender side of a running transport.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    cmd_tx: mpsc::Sender<TransportCommand>,
}

impl TransportHandle {
    /// Wrap a raw command sender, e.g. one served by an in-process fake.
    pub fn from_sender(cmd_tx: mpsc::Sender<TransportCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Issue a request and wait for its response. There is no timeout here;
    /// the call resolves when the server answers or the connection drops.
    pub async fn request(&self, name: &str, payload: Value) -> Result<Value> {
        let (reply, response) = oneshot::channel();

        self.cmd_tx
            .send(TransportCommand::Request {
                name: name.to_string(),
                payload,
                reply,
            })
            .await
            .map_err(|_| TransportError::Closed)?;

        response.await.map_err(|_| TransportError::Closed)?
    }

    /// Ask the connection task to stop.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(TransportCommand::Shutdown).await;
    }
}

/// Run the protocol over an already connected byte stream.
///
/// Returns the handle for requests and the notification receiver. The task
/// ends when the stream closes or [`TransportHandle::shutdown`] is called;
/// the notification channel then closes too.
pub fn spawn_transport<S>(
    stream: S,
    config: TransportConfig,
) -> (TransportHandle, mpsc::Receiver<TransportNotification>)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TransportCommand>(TRANSPORT_CHANNEL_CAPACITY);
    let (notif_tx, notif_rx) = mpsc::channel::<TransportNotification>(TRANSPORT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        match run_connection(stream, &config, &mut cmd_rx, &notif_tx).await {
            ConnectionEnd::Shutdown => info!("Transport shut down"),
            ConnectionEnd::Lost(reason) => {
                warn!(reason = %reason, "Connection lost");
                let _ = notif_tx
                    .send(TransportNotification::Disconnected { reason })
                    .await;
            }
        }
    });

    (TransportHandle::from_sender(cmd_tx), notif_rx)
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

pub(crate) enum ConnectionEnd {
    Shutdown,
    Lost(String),
}

type Pending = HashMap<Uuid, oneshot::Sender<Result<Value>>>;

pub(crate) async fn run_connection<S>(
    stream: S,
    config: &TransportConfig,
    cmd_rx: &mut mpsc::Receiver<TransportCommand>,
    notif_tx: &mpsc::Sender<TransportNotification>,
) -> ConnectionEnd
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut lines = BufReader::new(read_half).lines();
    let mut pending = Pending::new();

    let hello = Frame::Hello {
        username: config.username.clone(),
        token: config.token.clone(),
    };
    if let Err(e) = write_frame(&mut write_half, &hello).await {
        return ConnectionEnd::Lost(e.to_string());
    }
    let _ = notif_tx.send(TransportNotification::Connected).await;
    debug!(username = %config.username, "Hello sent");

    let end = loop {
        tokio::select! {
            // --- Outgoing requests ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(TransportCommand::Request { name, payload, reply }) => {
                        let id = Uuid::new_v4();
                        let frame = Frame::Request { id, name: name.clone(), payload };
                        match write_frame(&mut write_half, &frame).await {
                            Ok(()) => {
                                debug!(request = %name, id = %id, "Request sent");
                                pending.insert(id, reply);
                            }
                            Err(TransportError::Io(e)) => {
                                let reason = e.to_string();
                                let _ = reply.send(Err(TransportError::Io(e)));
                                break ConnectionEnd::Lost(reason);
                            }
                            Err(e) => {
                                warn!(request = %name, error = %e, "Failed to encode request");
                                let _ = reply.send(Err(e));
                            }
                        }
                    }
                    Some(TransportCommand::Shutdown) | None => break ConnectionEnd::Shutdown,
                }
            }

            // --- Incoming frames ---
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => handle_line(&line, &mut pending, notif_tx).await,
                    Ok(None) => break ConnectionEnd::Lost("connection closed by server".into()),
                    Err(e) => break ConnectionEnd::Lost(e.to_string()),
                }
            }
        }
    };

    if !pending.is_empty() {
        debug!(count = pending.len(), "Failing pending requests");
    }
    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(TransportError::Closed));
    }

    end
}

async fn handle_line(
    line: &str,
    pending: &mut Pending,
    notif_tx: &mpsc::Sender<TransportNotification>,
) {
    if line.trim().is_empty() {
        return;
    }

    let frame = match Frame::decode(line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Dropping undecodable frame");
            return;
        }
    };

    match frame {
        Frame::Response { id, payload, error } => {
            let Some(reply) = pending.remove(&id) else {
                warn!(id = %id, "Response for unknown request");
                return;
            };
            let outcome = match error {
                Some(message) => Err(TransportError::Rejected(message)),
                None => Ok(payload),
            };
            let _ = reply.send(outcome);
        }
        Frame::Event { name, payload } => {
            debug!(event = %name, "Event received");
            let _ = notif_tx
                .send(TransportNotification::Event { name, payload })
                .await;
        }
        other => {
            debug!(frame = ?other, "Ignoring client-side frame from server");
        }
    }
}

async fn write_frame<W>(writer: &mut WriteHalf<W>, frame: &Frame) -> Result<()>
where
    W: AsyncRead + AsyncWrite,
{
    let line = frame.encode()?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
