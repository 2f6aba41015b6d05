pub mod commands;
pub mod config;
pub mod events;
pub mod hooks;
pub mod session;
pub mod state;

mod error;

pub use commands::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::EventIngestion;
pub use hooks::{LogNavigator, LogNotifier, Navigator, NotificationSink};
pub use session::{Session, SessionHooks};
pub use state::SharedStore;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("messenger_client=debug,messenger_net=debug,messenger_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
