//! Error types for the replication layer.

use thiserror::Error;

/// Result type alias using [`NetError`].
pub type Result<T> = std::result::Result<T, NetError>;

/// Top-level error type for replication failures.
#[derive(Debug, Error)]
pub enum NetError {
    /// A received frame could not be decoded.
    #[error("Failed to decode frame: {0}")]
    DecodeError(String),

    /// An event could not be encoded for transmission.
    #[error("Failed to encode event: {0}")]
    EncodeError(String),

    /// The transport refused the frame.
    #[error("Transport send failed: {0}")]
    SendFailed(String),
}
