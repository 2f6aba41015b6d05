use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Frame error: {0}")]
    Frame(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
