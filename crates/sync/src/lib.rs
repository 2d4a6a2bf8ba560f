//! Outbound block synchronization for emberchain.
//!
//! Implements the per-peer request/response state machine, the concurrent
//! peer registry, and the outbound coordinator that turns free peers into
//! header and body requests. Network transport and block import are
//! external collaborators reached through channel ports.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod network;
pub mod peer;
pub mod peer_set;
pub mod protocol;

pub use coordinator::{CoordinatorConfig, ImportEvent, SyncCoordinator};
pub use error::{Result, SyncError};
pub use network::{
    IncomingSyncMessage, OutgoingSyncMessage, SyncNetworkAdapter, SyncNetworkSender,
    SYNC_CHANNEL_CAPACITY,
};
pub use peer::{OutboundStatus, SyncPeer};
pub use peer_set::{SyncPeerSet, PEER_INACTIVE_TIMEOUT};
pub use protocol::{
    BodiesRequest, BodiesResponse, HeadersRequest, HeadersResponse, StatusMessage, SyncMessage,
    MAX_BODIES_PER_REQUEST, MAX_HEADERS_PER_REQUEST,
};
