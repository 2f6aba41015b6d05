//! TCP dialer with automatic reconnect.
//!
//! The command channel outlives individual connections: while the socket is
//! down, requests fail fast with [`TransportError::Closed`] instead of
//! queueing, and a fresh [`TransportNotification::Connected`] is emitted
//! after every successful redial.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, warn};

use messenger_shared::constants::TRANSPORT_CHANNEL_CAPACITY;

use crate::error::TransportError;
use crate::transport::{
    run_connection, ConnectionEnd, TransportCommand, TransportConfig, TransportHandle,
    TransportNotification,
};

/// Backoff between reconnect attempts.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Dial `addr` in a background task and keep the connection alive.
pub fn spawn_tcp(
    addr: String,
    config: TransportConfig,
    policy: ReconnectPolicy,
) -> (TransportHandle, mpsc::Receiver<TransportNotification>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TransportCommand>(TRANSPORT_CHANNEL_CAPACITY);
    let (notif_tx, notif_rx) = mpsc::channel::<TransportNotification>(TRANSPORT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut delay = policy.initial_delay;

        loop {
            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    info!(addr = %addr, "Connected to chat server");
                    delay = policy.initial_delay;

                    match run_connection(stream, &config, &mut cmd_rx, &notif_tx).await {
                        ConnectionEnd::Shutdown => break,
                        ConnectionEnd::Lost(reason) => {
                            warn!(addr = %addr, reason = %reason, "Connection lost, will redial");
                            let _ = notif_tx
                                .send(TransportNotification::Disconnected { reason })
                                .await;
                        }
                    }
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, delay_ms = delay.as_millis() as u64, "Dial failed");
                }
            }

            if wait_before_redial(&mut cmd_rx, delay).await {
                break;
            }
            delay = next_delay(delay, &policy);
        }

        info!(addr = %addr, "TCP transport stopped");
    });

    (TransportHandle::from_sender(cmd_tx), notif_rx)
}

fn next_delay(delay: Duration, policy: &ReconnectPolicy) -> Duration {
    delay.saturating_mul(2).min(policy.max_delay)
}

/// Sleep for `delay`, rejecting requests in the meantime. Returns `true`
/// when a shutdown was requested.
async fn wait_before_redial(cmd_rx: &mut mpsc::Receiver<TransportCommand>, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(TransportCommand::Request { reply, .. }) => {
                        let _ = reply.send(Err(TransportError::Closed));
                    }
                    Some(TransportCommand::Shutdown) | None => return true,
                }
            }
        }
    }
}
