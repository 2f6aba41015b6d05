use thiserror::Error;

/// Errors produced by the store layer.
///
/// Entity mutations never fail; only the preference backends can.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the preferences directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The preferences file is not a JSON object of strings.
    #[error("Preferences JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
