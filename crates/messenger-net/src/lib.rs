// Client transport: newline-delimited JSON frames over an async byte stream.

pub mod error;
pub mod frame;
pub mod tcp;
pub mod transport;

pub use error::TransportError;
pub use frame::Frame;
pub use tcp::{spawn_tcp, ReconnectPolicy};
pub use transport::{
    spawn_transport, TransportCommand, TransportConfig, TransportHandle, TransportNotification,
};
