//! Integration test for the outbound sync flow.
//!
//! Drives a coordinator against a simulated remote peer on the far side of
//! the network adapter channels and verifies that only validated batches
//! reach the block-import port, and that a peer left claimed by a bad
//! response is recovered by the inactivity sweep.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{B256, U256};
use ember_sync::{
    BodiesResponse, CoordinatorConfig, HeadersResponse, ImportEvent, OutboundStatus,
    StatusMessage, SyncCoordinator, SyncMessage, SyncNetworkAdapter, SyncNetworkSender,
    SyncPeerSet,
};
use ember_types::{BlockBody, BlockHeader, NodeRecord, SealType};
use tokio::sync::mpsc;

fn header(number: u64) -> BlockHeader {
    BlockHeader::new(
        number,
        B256::repeat_byte(0x11),
        1_700_000_000 + number,
        U256::from(1_000u64),
        15_000_000,
        9_000_000,
        SealType::ProofOfWork,
    )
}

fn headers_from(start: u64, count: u64) -> Vec<BlockHeader> {
    (start..start + count).map(header).collect()
}

struct Remote {
    record: NodeRecord,
    sender: SyncNetworkSender,
}

impl Remote {
    async fn send(&self, message: SyncMessage) {
        self.sender
            .forward_message(self.record.id_hash, message)
            .await;
    }
}

struct TestNet {
    adapter: SyncNetworkAdapter,
    coordinator: SyncCoordinator,
    outgoing_rx: mpsc::Receiver<ember_sync::OutgoingSyncMessage>,
    import_rx: mpsc::Receiver<ImportEvent>,
    remote: Remote,
}

fn test_net() -> TestNet {
    let (adapter, incoming_tx, outgoing_rx) = SyncNetworkAdapter::new();
    let (import_tx, import_rx) = mpsc::channel(16);
    let peers = Arc::new(SyncPeerSet::new());
    let coordinator = SyncCoordinator::new(
        CoordinatorConfig::default(),
        Arc::clone(&peers),
        adapter.outgoing_sender(),
        import_tx,
    );

    let record = NodeRecord::new("p2p://fedcba9876543210fedcba9876543210");
    coordinator.register_discovered(std::slice::from_ref(&record));

    TestNet {
        adapter,
        coordinator,
        outgoing_rx,
        import_rx,
        remote: Remote {
            record,
            sender: SyncNetworkSender::new(incoming_tx),
        },
    }
}

impl TestNet {
    /// Pump every queued incoming message through the coordinator.
    async fn pump(&mut self) {
        while let Some(incoming) = self.adapter.try_recv() {
            self.coordinator
                .handle_message(incoming)
                .await
                .expect("ports open");
        }
    }
}

#[tokio::test]
async fn test_full_sync_cycle_over_the_wire() {
    let mut net = test_net();
    net.coordinator.note_imported(499);

    // The remote announces its chain view.
    net.remote
        .send(SyncMessage::Status(StatusMessage {
            best_block_number: 1_000,
            total_difficulty: U256::from(123_456u64),
        }))
        .await;
    net.pump().await;

    let peer = net
        .coordinator
        .peer_set()
        .get(net.remote.record.id_hash)
        .expect("registered");
    assert_eq!(peer.best_block_number(), 1_000);

    // Headers leg: the coordinator asks, the remote answers in range.
    net.coordinator.tick().await.expect("ports open");
    let request = net.outgoing_rx.recv().await.expect("header request");
    let (start, count) = match request.message {
        SyncMessage::GetHeaders(request) => (request.start_block, u64::from(request.count)),
        other => panic!("expected GetHeaders, got {}", other.message_type()),
    };
    assert_eq!(start, 500);

    net.remote
        .send(SyncMessage::Headers(HeadersResponse {
            headers: headers_from(start, count),
        }))
        .await;
    net.pump().await;

    match net.import_rx.recv().await.expect("validated headers") {
        ImportEvent::Headers { headers, .. } => assert_eq!(headers.len(), count as usize),
        other => panic!("expected headers event, got {other:?}"),
    }

    // Bodies leg: same range, back to Free on success.
    net.coordinator.tick().await.expect("ports open");
    let request = net.outgoing_rx.recv().await.expect("body request");
    match request.message {
        SyncMessage::GetBodies(request) => assert_eq!(request.start_block, start),
        other => panic!("expected GetBodies, got {}", other.message_type()),
    }

    net.remote
        .send(SyncMessage::Bodies(BodiesResponse {
            first_block_number: start,
            bodies: vec![BlockBody::default(); count as usize],
        }))
        .await;
    net.pump().await;

    match net.import_rx.recv().await.expect("validated bodies") {
        ImportEvent::Bodies {
            first_block_number, ..
        } => assert_eq!(first_block_number, start),
        other => panic!("expected bodies event, got {other:?}"),
    }

    assert_eq!(peer.outbound_status(), OutboundStatus::Free);
}

#[tokio::test]
async fn test_sweep_recovers_peer_stuck_on_bad_response() {
    let mut net = test_net();

    net.coordinator.tick().await.expect("ports open");
    net.outgoing_rx.recv().await.expect("header request");

    // Remote answers with the wrong range; the batch is rejected and the
    // peer stays claimed.
    net.remote
        .send(SyncMessage::Headers(HeadersResponse {
            headers: headers_from(9_999, 4),
        }))
        .await;
    net.pump().await;

    assert!(net.import_rx.try_recv().is_err());
    let peer = net
        .coordinator
        .peer_set()
        .get(net.remote.record.id_hash)
        .expect("registered");
    assert_eq!(peer.outbound_status(), OutboundStatus::HeadersRequested);

    // With no further traffic the inactivity sweep evicts it.
    let later = Instant::now() + Duration::from_millis(21_000);
    assert_eq!(net.coordinator.peer_set().remove_inactive_at(later), 1);
    assert!(net.coordinator.peer_set().is_empty());
}
