//! Network adapter for outbound sync
//!
//! Provides a channel-based interface between the host network layer and
//! the sync coordinator. Responses arrive as independent callback
//! invocations on the network side; the channels decouple their threading
//! from the coordinator's.

use crate::protocol::SyncMessage;
use tokio::sync::mpsc;
use tracing::warn;

/// Message with peer context for incoming messages
#[derive(Debug, Clone)]
pub struct IncomingSyncMessage {
    /// Identity hash of the peer that sent the message
    pub peer_id_hash: i32,
    /// The sync message
    pub message: SyncMessage,
}

/// Message with target peer for outgoing messages
#[derive(Debug, Clone)]
pub struct OutgoingSyncMessage {
    /// Target peer identity hash (None for broadcast)
    pub target_peer: Option<i32>,
    /// The sync message to send
    pub message: SyncMessage,
}

/// Channel capacity for sync messages
pub const SYNC_CHANNEL_CAPACITY: usize = 256;

/// Network adapter connecting the sync coordinator to the network layer
///
/// The coordinator uses this to receive messages from peers and send
/// requests to peers without knowing about the network implementation
/// details.
pub struct SyncNetworkAdapter {
    /// Receiver for incoming sync messages from the network
    incoming_rx: mpsc::Receiver<IncomingSyncMessage>,
    /// Sender for outgoing sync messages to the network
    outgoing_tx: mpsc::Sender<OutgoingSyncMessage>,
}

impl SyncNetworkAdapter {
    /// Create a new adapter with connected channel ends
    ///
    /// Returns the adapter and the channel ends that should be given to
    /// the network layer.
    #[allow(clippy::type_complexity)]
    pub fn new() -> (
        Self,
        mpsc::Sender<IncomingSyncMessage>,
        mpsc::Receiver<OutgoingSyncMessage>,
    ) {
        let (incoming_tx, incoming_rx) = mpsc::channel(SYNC_CHANNEL_CAPACITY);
        let (outgoing_tx, outgoing_rx) = mpsc::channel(SYNC_CHANNEL_CAPACITY);

        let adapter = Self {
            incoming_rx,
            outgoing_tx,
        };

        (adapter, incoming_tx, outgoing_rx)
    }

    /// Sender half for the coordinator's outgoing requests.
    pub fn outgoing_sender(&self) -> mpsc::Sender<OutgoingSyncMessage> {
        self.outgoing_tx.clone()
    }

    /// Receive the next incoming message (async)
    pub async fn recv(&mut self) -> Option<IncomingSyncMessage> {
        self.incoming_rx.recv().await
    }

    /// Try to receive a message without blocking
    pub fn try_recv(&mut self) -> Option<IncomingSyncMessage> {
        self.incoming_rx.try_recv().ok()
    }

    /// Send a message to a specific peer
    pub async fn send(&self, peer_id_hash: i32, message: SyncMessage) {
        let outgoing = OutgoingSyncMessage {
            target_peer: Some(peer_id_hash),
            message,
        };
        if self.outgoing_tx.send(outgoing).await.is_err() {
            warn!("failed to send sync message - channel closed");
        }
    }

    /// Broadcast a message to all peers
    pub async fn broadcast(&self, message: SyncMessage) {
        let outgoing = OutgoingSyncMessage {
            target_peer: None,
            message,
        };
        if self.outgoing_tx.send(outgoing).await.is_err() {
            warn!("failed to broadcast sync message - channel closed");
        }
    }
}

/// Handle for the network layer to feed received messages into sync
#[derive(Clone)]
pub struct SyncNetworkSender {
    tx: mpsc::Sender<IncomingSyncMessage>,
}

impl SyncNetworkSender {
    /// Create from the sender channel
    pub fn new(tx: mpsc::Sender<IncomingSyncMessage>) -> Self {
        Self { tx }
    }

    /// Forward a received sync message from a peer
    pub async fn forward_message(&self, peer_id_hash: i32, message: SyncMessage) {
        let incoming = IncomingSyncMessage {
            peer_id_hash,
            message,
        };
        if self.tx.send(incoming).await.is_err() {
            warn!("failed to forward sync message - sync receiver dropped");
        }
    }
}
