use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use messenger_client::{
    init_tracing, ClientConfig, LogNavigator, LogNotifier, Session, SessionHooks, SharedStore,
};
use messenger_net::{spawn_tcp, ReconnectPolicy};
use messenger_shared::constants::APP_NAME;
use messenger_store::{EntityStore, FilePreferences, Preferences};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::from_env();
    let auth = config.auth();
    if auth.username.is_empty() {
        bail!("MESSENGER_USERNAME must be set");
    }

    info!(app = APP_NAME, user = %auth.username, server = %config.server_addr, "Starting client");

    let preferences: Arc<dyn Preferences> = match &config.preferences_path {
        Some(path) => Arc::new(FilePreferences::open_at(path.clone())),
        None => Arc::new(
            FilePreferences::default_location().context("Failed to locate preferences file")?,
        ),
    };

    let store = SharedStore::new(EntityStore::new(auth.username.clone()))
        .with_typing_timeout(config.typing_timeout);

    let (transport, notifications) = spawn_tcp(
        config.server_addr.clone(),
        config.transport(),
        ReconnectPolicy::default(),
    );
    let hooks = SessionHooks {
        preferences,
        notifier: Arc::new(LogNotifier),
        navigator: Arc::new(LogNavigator),
    };
    let session = Session::start(
        transport,
        notifications,
        store.clone(),
        hooks,
        config.sync_on_connect,
    );

    let mut changes = store.subscribe();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                log_conversations(&store);
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    session.shutdown().await;
    Ok(())
}

fn log_conversations(store: &SharedStore) {
    store.view(|view| {
        for conversation in view.conversations() {
            info!(
                conversation = %conversation.id,
                title = %conversation.title,
                messages = conversation.messages.len(),
                online = conversation.is_online,
                "Conversation"
            );
        }
    });
}
