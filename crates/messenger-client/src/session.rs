//! Session lifetime: wires the transport to ingestion and the request
//! adapter.
//!
//! A [`Session`] owns the notification loop. Starting it subscribes the
//! ingestion adapter to every push event; dropping or shutting it down
//! unsubscribes. On every (re)connect it optionally runs an authoritative
//! re-sync.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, warn};

use messenger_net::{TransportHandle, TransportNotification};
use messenger_store::Preferences;

use crate::commands::Client;
use crate::events::EventIngestion;
use crate::hooks::{Navigator, NotificationSink};
use crate::state::SharedStore;

/// External collaborators a session calls out to.
#[derive(Clone)]
pub struct SessionHooks {
    pub preferences: Arc<dyn Preferences>,
    pub notifier: Arc<dyn NotificationSink>,
    pub navigator: Arc<dyn Navigator>,
}

pub struct Session {
    client: Client,
    transport: TransportHandle,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Start consuming `notifications`. Must be called inside a tokio
    /// runtime.
    pub fn start(
        transport: TransportHandle,
        notifications: mpsc::Receiver<TransportNotification>,
        store: SharedStore,
        hooks: SessionHooks,
        sync_on_connect: bool,
    ) -> Self {
        let client = Client::new(transport.clone(), store.clone(), hooks.navigator);
        let ingestion = EventIngestion::new(store, hooks.preferences, hooks.notifier);

        let task = tokio::spawn(notification_loop(
            notifications,
            ingestion,
            client.clone(),
            sync_on_connect,
        ));
        info!("Session started");

        Self {
            client,
            transport,
            task: Some(task),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &SharedStore {
        self.client.store()
    }

    /// Close the transport and wait for the notification loop to drain. A
    /// sync still in flight is cancelled.
    pub async fn shutdown(mut self) {
        self.transport.shutdown().await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Notification loop ended abnormally");
            }
        }
        info!("Session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Syncs run in a [`JoinSet`] owned by the loop, so ending or aborting the
/// loop cancels any sync still in flight.
async fn notification_loop(
    mut notifications: mpsc::Receiver<TransportNotification>,
    ingestion: EventIngestion,
    client: Client,
    sync_on_connect: bool,
) {
    let mut syncs = JoinSet::new();

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    break;
                };
                match notification {
                    TransportNotification::Connected => {
                        info!("Connected");
                        if sync_on_connect {
                            // Run beside the loop: responses and events share
                            // the transport, so awaiting here could stall both.
                            let client = client.clone();
                            syncs.spawn(async move {
                                if let Err(e) = client.sync().await {
                                    warn!(error = %e, "Sync after connect failed");
                                }
                            });
                        }
                    }
                    TransportNotification::Event { name, payload } => {
                        ingestion.handle(&name, payload);
                    }
                    TransportNotification::Disconnected { reason } => {
                        warn!(reason = %reason, "Disconnected");
                    }
                }
            }
            Some(joined) = syncs.join_next(), if !syncs.is_empty() => {
                if let Err(e) = joined {
                    if !e.is_cancelled() {
                        warn!(error = %e, "Sync task ended abnormally");
                    }
                }
            }
        }
    }

    info!("Notification loop ended");
}
