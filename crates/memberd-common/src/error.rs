//! Common error types for memberd components.

use thiserror::Error;

/// Common errors across memberd components
#[derive(Debug, Error)]
pub enum MemberdError {
    /// Configuration error (invalid intervals, fanout, addresses)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport (UDP socket) error
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Wire payload encode/decode error
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Cluster state error
    #[error("Cluster error: {0}")]
    Cluster(String),
}

impl MemberdError {
    /// Returns true if the node should abort startup on this error.
    ///
    /// Only configuration errors are fatal; transport and codec
    /// failures are isolated to the operation that hit them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
