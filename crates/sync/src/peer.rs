//! Per-peer outbound synchronization state machine.
//!
//! Each peer cycles through `Free -> HeadersRequested -> HeadersReceived ->
//! BodiesRequested -> Free`. Responses are only accepted when they pair
//! with the outstanding request; anything else leaves the state untouched
//! and is reported to the caller through the boolean return.
//!
//! Lock discipline: the timestamp group and the state group are guarded by
//! separate mutexes so liveness sweeps reading timestamps do not contend
//! with state transitions. When both are needed the timestamp lock is
//! always taken first; every method in this module follows that order.

use alloy_primitives::U256;
use ember_types::NodeRecord;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// Position in the outbound header/body request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundStatus {
    /// Eligible for a new header request.
    Free,
    /// Header request in flight.
    HeadersRequested,
    /// Headers validated; eligible for the matching body request.
    HeadersReceived,
    /// Body request in flight.
    BodiesRequested,
}

/// Last-received instants, one per message class plus the aggregate.
#[derive(Debug, Clone, Copy)]
struct Timestamps {
    last_received: Instant,
    last_status: Instant,
    last_headers: Instant,
    last_bodies: Instant,
}

impl Timestamps {
    fn new(now: Instant) -> Self {
        Self {
            last_received: now,
            last_status: now,
            last_headers: now,
            last_bodies: now,
        }
    }
}

/// Request pairing and chain knowledge.
#[derive(Debug)]
struct State {
    status: OutboundStatus,
    best_block_number: u64,
    total_difficulty: U256,
    last_requested_block_header: u64,
    rating: i32,
}

/// One connected peer's sync state.
///
/// Created when the peer is first observed and dropped only when the
/// registry evicts it for inactivity; all methods are safe to call from
/// any thread.
#[derive(Debug)]
pub struct SyncPeer {
    id_hash: i32,
    short_id: String,
    timestamps: Mutex<Timestamps>,
    state: Mutex<State>,
}

impl SyncPeer {
    /// Create the state for a newly discovered peer.
    pub fn new(record: &NodeRecord) -> Self {
        Self {
            id_hash: record.id_hash,
            short_id: record.short_id.clone(),
            timestamps: Mutex::new(Timestamps::new(Instant::now())),
            state: Mutex::new(State {
                status: OutboundStatus::Free,
                best_block_number: 0,
                total_difficulty: U256::ZERO,
                last_requested_block_header: 0,
                rating: 0,
            }),
        }
    }

    /// Identity key of this peer.
    pub fn id_hash(&self) -> i32 {
        self.id_hash
    }

    /// Display form of this peer's identifier.
    pub fn short_id(&self) -> &str {
        &self.short_id
    }

    /// Current position in the request cycle.
    pub fn outbound_status(&self) -> OutboundStatus {
        self.state.lock().status
    }

    /// Check whether the peer is eligible for a new sync request.
    pub fn is_free(&self) -> bool {
        self.state.lock().status == OutboundStatus::Free
    }

    /// Check whether a header request may be issued.
    pub fn can_send_headers(&self) -> bool {
        self.state.lock().status == OutboundStatus::Free
    }

    /// Check whether a body request may be issued.
    pub fn can_send_bodies(&self) -> bool {
        self.state.lock().status == OutboundStatus::HeadersReceived
    }

    /// Starting block number of the outstanding header request.
    pub fn last_requested_block_header(&self) -> u64 {
        self.state.lock().last_requested_block_header
    }

    /// Best block number this peer has reported.
    pub fn best_block_number(&self) -> u64 {
        self.state.lock().best_block_number
    }

    /// Total difficulty this peer has reported.
    pub fn total_difficulty(&self) -> U256 {
        self.state.lock().total_difficulty
    }

    /// Informational peer rating.
    pub fn rating(&self) -> i32 {
        self.state.lock().rating
    }

    /// Atomically claim the peer for a header request starting at `start`.
    ///
    /// Returns false without changes if the peer is not free. The caller
    /// (the coordinator) must issue the request only after this returns
    /// true, so the transition is visible before the request leaves the
    /// process.
    pub fn try_begin_headers_request(&self, start: u64) -> bool {
        let mut state = self.state.lock();
        if state.status != OutboundStatus::Free {
            return false;
        }
        state.last_requested_block_header = start;
        state.status = OutboundStatus::HeadersRequested;
        true
    }

    /// Atomically claim the peer for the body request matching its last
    /// validated header batch.
    ///
    /// Returns false without changes unless headers were received.
    pub fn try_begin_bodies_request(&self) -> bool {
        let mut state = self.state.lock();
        if state.status != OutboundStatus::HeadersReceived {
            return false;
        }
        state.status = OutboundStatus::BodiesRequested;
        true
    }

    /// Validate an incoming header batch against the outstanding request.
    ///
    /// Stamps the receive times unconditionally. Returns false for
    /// unsolicited batches (no header request in flight) and for batches
    /// whose first block number does not match the request; neither case
    /// changes the outbound status, so a mismatched peer stays claimed
    /// until the inactivity sweep recovers it.
    pub fn check_headers_response(&self, first_block_number: u64) -> bool {
        let mut timestamps = self.timestamps.lock();
        let now = Instant::now();
        timestamps.last_received = now;
        timestamps.last_headers = now;

        let mut state = self.state.lock();
        if state.status != OutboundStatus::HeadersRequested {
            return false;
        }
        if first_block_number != state.last_requested_block_header {
            return false;
        }
        state.status = OutboundStatus::HeadersReceived;
        true
    }

    /// Validate an incoming body batch against the outstanding request.
    ///
    /// Symmetric to [`Self::check_headers_response`]; the first body block
    /// number is compared against the header request start, since header
    /// and body batches cover the same range. On success the peer returns
    /// to `Free`, closing the cycle.
    pub fn check_bodies_response(&self, first_block_number: u64) -> bool {
        let mut timestamps = self.timestamps.lock();
        let now = Instant::now();
        timestamps.last_received = now;
        timestamps.last_bodies = now;

        let mut state = self.state.lock();
        if state.status != OutboundStatus::BodiesRequested {
            return false;
        }
        if first_block_number != state.last_requested_block_header {
            return false;
        }
        state.status = OutboundStatus::Free;
        true
    }

    /// Record a status message from the peer.
    ///
    /// The reported values are the peer's self-description, so regressions
    /// are logged but never rejected; both fields are overwritten
    /// unconditionally and the rating is bumped for the sign of life.
    pub fn process_status_update(&self, best_block_number: u64, total_difficulty: U256) {
        let mut timestamps = self.timestamps.lock();
        let now = Instant::now();
        timestamps.last_received = now;
        timestamps.last_status = now;

        let mut state = self.state.lock();
        if best_block_number < state.best_block_number {
            warn!(
                peer = %self.short_id,
                previous = state.best_block_number,
                reported = best_block_number,
                "peer reported a regressed best block"
            );
        }
        state.best_block_number = best_block_number;
        state.total_difficulty = total_difficulty;
        state.rating += 1;
    }

    /// Time since the last message of any kind, as seen at `now`.
    pub fn last_received_elapsed(&self, now: Instant) -> Duration {
        let timestamps = self.timestamps.lock();
        now.saturating_duration_since(timestamps.last_received)
    }

    /// Time since the last status message, as seen at `now`.
    pub fn last_status_elapsed(&self, now: Instant) -> Duration {
        let timestamps = self.timestamps.lock();
        now.saturating_duration_since(timestamps.last_status)
    }

    /// Time since the last headers message, as seen at `now`.
    pub fn last_headers_elapsed(&self, now: Instant) -> Duration {
        let timestamps = self.timestamps.lock();
        now.saturating_duration_since(timestamps.last_headers)
    }

    /// Time since the last bodies message, as seen at `now`.
    pub fn last_bodies_elapsed(&self, now: Instant) -> Duration {
        let timestamps = self.timestamps.lock();
        now.saturating_duration_since(timestamps.last_bodies)
    }

    /// Overwrite the aggregate receive timestamp (test support for the
    /// inactivity sweep).
    #[cfg(test)]
    pub(crate) fn set_last_received(&self, at: Instant) {
        self.timestamps.lock().last_received = at;
    }
}
