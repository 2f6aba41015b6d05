use thiserror::Error;

use messenger_net::TransportError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to encode {name} request: {source}")]
    Encode {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode {name} response: {source}")]
    Decode {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
