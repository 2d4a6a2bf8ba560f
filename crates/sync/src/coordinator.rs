//! Outbound sync coordinator
//!
//! Turns the peer registry into a working sync engine: the periodic tick
//! sweeps inactive peers and dispatches header/body requests to eligible
//! ones, and incoming responses are validated against per-peer state
//! before anything reaches the block importer.
//!
//! The coordinator never tears down connections. Rejected responses are
//! logged and counted; a peer left claimed by a mismatched response is
//! recovered by the inactivity sweep.

use crate::error::{Result, SyncError};
use crate::metrics;
use crate::network::{IncomingSyncMessage, OutgoingSyncMessage};
use crate::peer_set::SyncPeerSet;
use crate::protocol::{BodiesRequest, HeadersRequest, SyncMessage, MAX_HEADERS_PER_REQUEST};
use ember_types::{BlockBody, BlockHeader, NodeRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default number of blocks covered per request pair.
pub const DEFAULT_BATCH_SIZE: u32 = 96;

/// Coordinator tuning knobs.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Blocks covered per header/body request pair; capped at
    /// [`MAX_HEADERS_PER_REQUEST`].
    pub batch_size: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Validated batches handed to the block importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    /// A validated header run.
    Headers {
        /// Peer the run came from.
        peer_id_hash: i32,
        /// Headers in ascending block-number order.
        headers: Vec<BlockHeader>,
    },
    /// A validated body run.
    Bodies {
        /// Peer the run came from.
        peer_id_hash: i32,
        /// Block number of the first body.
        first_block_number: u64,
        /// Bodies in ascending block-number order.
        bodies: Vec<BlockBody>,
    },
}

/// Orchestrates outbound sync requests across the peer set.
///
/// `tick` and `handle_message` are safe to call from any task, but request
/// dispatch is designed for a single driving task: peers are claimed
/// through their own atomic transitions, so even racing ticks never issue
/// a request twice, they just skip the peer.
pub struct SyncCoordinator {
    config: CoordinatorConfig,
    peers: Arc<SyncPeerSet>,
    outgoing_tx: mpsc::Sender<OutgoingSyncMessage>,
    import_tx: mpsc::Sender<ImportEvent>,
    local_best: AtomicU64,
}

impl SyncCoordinator {
    /// Create a coordinator over `peers`, sending requests through
    /// `outgoing_tx` and validated batches through `import_tx`.
    pub fn new(
        config: CoordinatorConfig,
        peers: Arc<SyncPeerSet>,
        outgoing_tx: mpsc::Sender<OutgoingSyncMessage>,
        import_tx: mpsc::Sender<ImportEvent>,
    ) -> Self {
        let batch_size = config.batch_size.min(MAX_HEADERS_PER_REQUEST);
        Self {
            config: CoordinatorConfig { batch_size },
            peers,
            outgoing_tx,
            import_tx,
            local_best: AtomicU64::new(0),
        }
    }

    /// The peer registry this coordinator drives.
    pub fn peer_set(&self) -> &Arc<SyncPeerSet> {
        &self.peers
    }

    /// Record that the chain imported up to `number`; future header
    /// requests start above it.
    pub fn note_imported(&self, number: u64) {
        self.local_best.fetch_max(number, Ordering::Relaxed);
    }

    /// Highest block number known to be imported locally.
    pub fn local_best(&self) -> u64 {
        self.local_best.load(Ordering::Relaxed)
    }

    /// Register freshly discovered peers; returns how many were new.
    pub fn register_discovered(&self, discovered: &[NodeRecord]) -> usize {
        let registered = self.peers.update_set(discovered);
        if !registered.is_empty() {
            debug!(count = registered.len(), "registered discovered peers");
        }
        registered.len()
    }

    /// One scheduling round: sweep inactive peers, then dispatch a request
    /// to every eligible peer.
    ///
    /// Each peer is claimed (state transition) before its request is
    /// handed to the network channel, closing the race between deciding to
    /// send and the response arriving. Header requests fan out over
    /// consecutive block windows above the local best.
    pub async fn tick(&self) -> Result<()> {
        self.peers.remove_inactive();

        let batch = self.config.batch_size;
        let mut next_start = self.local_best().saturating_add(1);

        for peer in self.peers.snapshot() {
            if peer.try_begin_bodies_request() {
                let request = BodiesRequest {
                    start_block: peer.last_requested_block_header(),
                    count: batch,
                };
                debug!(
                    peer = %peer.short_id(),
                    start = request.start_block,
                    "requesting bodies"
                );
                self.send_to(peer.id_hash(), SyncMessage::GetBodies(request))
                    .await?;
                metrics::record_request("bodies");
            } else if peer.try_begin_headers_request(next_start) {
                let request = HeadersRequest {
                    start_block: next_start,
                    count: batch,
                };
                debug!(
                    peer = %peer.short_id(),
                    start = request.start_block,
                    "requesting headers"
                );
                self.send_to(peer.id_hash(), SyncMessage::GetHeaders(request))
                    .await?;
                metrics::record_request("headers");
                next_start = next_start.saturating_add(u64::from(batch));
            }
        }
        Ok(())
    }

    /// Process one message from a peer.
    ///
    /// Status updates always apply; header and body responses only reach
    /// the importer after validating against the peer's outstanding
    /// request.
    pub async fn handle_message(&self, incoming: IncomingSyncMessage) -> Result<()> {
        let Some(peer) = self.peers.get(incoming.peer_id_hash) else {
            debug!(
                peer_id_hash = incoming.peer_id_hash,
                message = incoming.message.message_type(),
                "message from unknown peer ignored"
            );
            return Ok(());
        };

        match incoming.message {
            SyncMessage::Status(status) => {
                peer.process_status_update(status.best_block_number, status.total_difficulty);
            }
            SyncMessage::Headers(response) => {
                let first = response.first_block_number();
                let accepted = first.is_some_and(|number| peer.check_headers_response(number));
                metrics::record_response("headers", accepted);
                if accepted {
                    self.import_tx
                        .send(ImportEvent::Headers {
                            peer_id_hash: peer.id_hash(),
                            headers: response.headers,
                        })
                        .await
                        .map_err(|_| SyncError::ImportChannelClosed)?;
                } else {
                    warn!(
                        peer = %peer.short_id(),
                        first_block = ?first,
                        "rejected headers response"
                    );
                }
            }
            SyncMessage::Bodies(response) => {
                let accepted = peer.check_bodies_response(response.first_block_number);
                metrics::record_response("bodies", accepted);
                if accepted {
                    self.import_tx
                        .send(ImportEvent::Bodies {
                            peer_id_hash: peer.id_hash(),
                            first_block_number: response.first_block_number,
                            bodies: response.bodies,
                        })
                        .await
                        .map_err(|_| SyncError::ImportChannelClosed)?;
                } else {
                    warn!(
                        peer = %peer.short_id(),
                        first_block = response.first_block_number,
                        "rejected bodies response"
                    );
                }
            }
            // Serving the request side of the protocol belongs to the
            // host's server task, not the outbound coordinator.
            SyncMessage::GetHeaders(_) | SyncMessage::GetBodies(_) => {
                debug!(
                    peer = %peer.short_id(),
                    "inbound request ignored by outbound coordinator"
                );
            }
        }
        Ok(())
    }

    async fn send_to(&self, peer_id_hash: i32, message: SyncMessage) -> Result<()> {
        self.outgoing_tx
            .send(OutgoingSyncMessage {
                target_peer: Some(peer_id_hash),
                message,
            })
            .await
            .map_err(|_| SyncError::NetworkChannelClosed)
    }
}
