//! Outbound sync wire messages
//!
//! Protocol identifier: `/emberchain/sync/1.0.0`
//!
//! Only the messages that drive the outbound state machine are modeled:
//! peer status broadcasts and the header/body request pairs. Serving the
//! request side is the host network layer's concern.

use alloy_primitives::U256;
use ember_types::{BlockBody, BlockHeader};
use serde::{Deserialize, Serialize};

/// Protocol identifier for outbound sync.
pub const SYNC_PROTOCOL_ID: &str = "/emberchain/sync/1.0.0";

/// Maximum headers per response.
pub const MAX_HEADERS_PER_REQUEST: u32 = 192;

/// Maximum bodies per response.
pub const MAX_BODIES_PER_REQUEST: u32 = 96;

/// Outbound sync protocol messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SyncMessage {
    /// Peer's self-reported chain status.
    Status(StatusMessage),

    /// Request a run of headers.
    GetHeaders(HeadersRequest),

    /// Response with headers.
    Headers(HeadersResponse),

    /// Request the bodies matching a previously fetched header run.
    GetBodies(BodiesRequest),

    /// Response with bodies.
    Bodies(BodiesResponse),
}

impl SyncMessage {
    /// Get message type name for logging.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Status(_) => "Status",
            Self::GetHeaders(_) => "GetHeaders",
            Self::Headers(_) => "Headers",
            Self::GetBodies(_) => "GetBodies",
            Self::Bodies(_) => "Bodies",
        }
    }
}

/// A peer's self-reported chain view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Peer's best block number.
    pub best_block_number: u64,
    /// Peer's total chain difficulty.
    pub total_difficulty: U256,
}

/// Header run request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeadersRequest {
    /// First block number requested (inclusive).
    pub start_block: u64,
    /// Number of headers requested.
    pub count: u32,
}

/// Header run response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeadersResponse {
    /// Headers in ascending block-number order.
    pub headers: Vec<BlockHeader>,
}

impl HeadersResponse {
    /// Block number of the first header, if any.
    pub fn first_block_number(&self) -> Option<u64> {
        self.headers.first().map(|header| header.number)
    }
}

/// Body run request; covers the same range as the preceding header request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodiesRequest {
    /// First block number requested (inclusive).
    pub start_block: u64,
    /// Number of bodies requested.
    pub count: u32,
}

/// Body run response.
///
/// Bodies do not embed their block number, so the response carries the
/// first number explicitly for request pairing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodiesResponse {
    /// Block number of the first body.
    pub first_block_number: u64,
    /// Bodies in ascending block-number order.
    pub bodies: Vec<BlockBody>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use ember_types::SealType;

    fn header(number: u64) -> BlockHeader {
        BlockHeader::new(
            number,
            B256::ZERO,
            1_700_000_000,
            U256::from(1u64),
            15_000_000,
            0,
            SealType::ProofOfWork,
        )
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let msg = SyncMessage::GetHeaders(HeadersRequest {
            start_block: 500,
            count: MAX_HEADERS_PER_REQUEST,
        });

        let encoded = bincode::serialize(&msg).expect("serialize");
        let decoded: SyncMessage = bincode::deserialize(&encoded).expect("deserialize");

        match decoded {
            SyncMessage::GetHeaders(request) => {
                assert_eq!(request.start_block, 500);
                assert_eq!(request.count, MAX_HEADERS_PER_REQUEST);
            }
            other => panic!("expected GetHeaders, got {}", other.message_type()),
        }
    }

    #[test]
    fn test_first_block_number() {
        let empty = HeadersResponse { headers: vec![] };
        assert_eq!(empty.first_block_number(), None);

        let response = HeadersResponse {
            headers: vec![header(500), header(501)],
        };
        assert_eq!(response.first_block_number(), Some(500));
    }

    #[test]
    fn test_message_type_names() {
        let status = SyncMessage::Status(StatusMessage {
            best_block_number: 10,
            total_difficulty: U256::from(100u64),
        });
        assert_eq!(status.message_type(), "Status");

        let bodies = SyncMessage::Bodies(BodiesResponse {
            first_block_number: 500,
            bodies: vec![BlockBody::default()],
        });
        assert_eq!(bodies.message_type(), "Bodies");
    }
}
