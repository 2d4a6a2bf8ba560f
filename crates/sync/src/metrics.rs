//! Sync layer metrics

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Gauge,
};

/// Number of registered sync peers
pub static SYNC_PEER_COUNT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("sync_peer_count", "Number of registered sync peers")
        .expect("Failed to register sync_peer_count metric")
});

/// Outbound sync requests by type
pub static SYNC_REQUESTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sync_requests_total",
        "Total outbound sync requests by type",
        &["type"]
    )
    .expect("Failed to register sync_requests metric")
});

/// Sync responses by type and validation outcome
pub static SYNC_RESPONSES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sync_responses_total",
        "Total sync responses by type and validation outcome",
        &["type", "outcome"]
    )
    .expect("Failed to register sync_responses metric")
});

/// Peers evicted by the inactivity sweep
pub static SYNC_PEERS_EVICTED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "sync_peers_evicted_total",
        "Total peers evicted by the inactivity sweep"
    )
    .expect("Failed to register sync_peers_evicted metric")
});

/// Update the peer count gauge
pub fn set_peer_count(count: usize) {
    SYNC_PEER_COUNT.set(count as f64);
}

/// Record an outbound request
pub fn record_request(request_type: &str) {
    SYNC_REQUESTS.with_label_values(&[request_type]).inc();
}

/// Record a response and whether it validated
pub fn record_response(response_type: &str, accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    SYNC_RESPONSES
        .with_label_values(&[response_type, outcome])
        .inc();
}

/// Record peers evicted by one sweep
pub fn record_evictions(count: usize) {
    if count > 0 {
        SYNC_PEERS_EVICTED.inc_by(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The registry is global and other tests in this crate touch the same
    // metrics concurrently, so assertions use private label values or
    // monotonic bounds rather than exact global readings.

    #[test]
    fn test_request_counter() {
        let label = "test-request-kind";
        record_request(label);
        record_request(label);
        assert_eq!(SYNC_REQUESTS.with_label_values(&[label]).get(), 2.0);
    }

    #[test]
    fn test_response_outcome_labels() {
        let label = "test-response-kind";
        record_response(label, true);
        record_response(label, false);
        record_response(label, false);
        assert_eq!(
            SYNC_RESPONSES.with_label_values(&[label, "accepted"]).get(),
            1.0
        );
        assert_eq!(
            SYNC_RESPONSES.with_label_values(&[label, "rejected"]).get(),
            2.0
        );
    }

    #[test]
    fn test_eviction_counter_only_grows() {
        let before = SYNC_PEERS_EVICTED.get();
        record_evictions(0);
        record_evictions(2);
        assert!(SYNC_PEERS_EVICTED.get() >= before + 2.0);
    }
}
