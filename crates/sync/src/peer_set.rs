//! Concurrent registry of known sync peers.
//!
//! A single lock guards all structural changes (registration, lookup,
//! eviction); per-peer state keeps its own locks. The set lock may be held
//! while taking a peer's state lock, never the reverse.

use crate::metrics;
use crate::peer::SyncPeer;
use ember_types::NodeRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// A peer from which no message arrived for this long is evicted.
///
/// This sweep is also the only recovery path for peers left claimed by a
/// mismatched response, so it must keep running even when the chain is
/// idle.
pub const PEER_INACTIVE_TIMEOUT: Duration = Duration::from_millis(20_000);

#[derive(Debug, Default)]
struct Inner {
    peers: HashMap<i32, Arc<SyncPeer>>,
    // Registration order; keeps free-peer snapshots deterministic.
    order: Vec<i32>,
}

/// The set of all known sync peers, keyed by identity hash.
#[derive(Debug, Default)]
pub struct SyncPeerSet {
    inner: Mutex<Inner>,
}

impl SyncPeerSet {
    /// Create an empty peer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every previously unseen peer among `discovered`.
    ///
    /// Returns only the newly created peers; re-discovered identities are
    /// left untouched.
    pub fn update_set(&self, discovered: &[NodeRecord]) -> Vec<Arc<SyncPeer>> {
        let mut inner = self.inner.lock();
        let mut registered = Vec::new();
        for record in discovered {
            if inner.peers.contains_key(&record.id_hash) {
                continue;
            }
            let peer = Arc::new(SyncPeer::new(record));
            inner.peers.insert(record.id_hash, Arc::clone(&peer));
            inner.order.push(record.id_hash);
            debug!(peer = %record.short_id, "registered sync peer");
            registered.push(peer);
        }
        metrics::set_peer_count(inner.peers.len());
        registered
    }

    /// Look up a peer by identity hash.
    pub fn get(&self, id_hash: i32) -> Option<Arc<SyncPeer>> {
        self.inner.lock().peers.get(&id_hash).cloned()
    }

    /// Point-in-time snapshot of the peers eligible for a new header
    /// request, in registration order.
    ///
    /// The snapshot is not a live view: two callers racing on it can both
    /// observe a peer as free, so picking a peer and claiming it must be
    /// serialized by the caller (the coordinator claims through the peer's
    /// own `try_begin_*` transitions).
    pub fn free_peers(&self) -> Vec<Arc<SyncPeer>> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.peers.get(id))
            .filter(|peer| peer.is_free())
            .cloned()
            .collect()
    }

    /// Point-in-time snapshot of every registered peer, in registration
    /// order.
    pub fn snapshot(&self) -> Vec<Arc<SyncPeer>> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.peers.get(id))
            .cloned()
            .collect()
    }

    /// Evict peers with no message for [`PEER_INACTIVE_TIMEOUT`].
    ///
    /// Driven periodically by the coordinator tick. Returns the number of
    /// evicted peers.
    pub fn remove_inactive(&self) -> usize {
        self.remove_inactive_at(Instant::now())
    }

    /// Eviction sweep against an explicit clock reading.
    pub fn remove_inactive_at(&self, now: Instant) -> usize {
        let mut inner = self.inner.lock();
        let stale: Vec<i32> = inner
            .peers
            .values()
            .filter(|peer| peer.last_received_elapsed(now) > PEER_INACTIVE_TIMEOUT)
            .map(|peer| peer.id_hash())
            .collect();
        for id in &stale {
            if let Some(peer) = inner.peers.remove(id) {
                debug!(peer = %peer.short_id(), "evicted inactive sync peer");
            }
        }
        inner.order.retain(|id| !stale.contains(id));
        metrics::set_peer_count(inner.peers.len());
        metrics::record_evictions(stale.len());
        stale.len()
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.inner.lock().peers.len()
    }

    /// Check whether no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().peers.is_empty()
    }
}
