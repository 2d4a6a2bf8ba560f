//! Synchronization error types
//!
//! Protocol violations (unsolicited or mismatched responses) are not
//! errors: the peer state machine signals them with boolean returns and
//! the coordinator logs and counts them. The error type here covers the
//! coordinator's ports to the host process.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Sync failure categories
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The outgoing network channel was dropped by the host.
    #[error("network channel closed")]
    NetworkChannelClosed,

    /// The block-import channel was dropped by the host.
    #[error("import channel closed")]
    ImportChannelClosed,
}
