//! Wire payload types shared across memberd components.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// One membership observation carried in a heartbeat.
///
/// `id` is the peer's canonical `host:port` identity; `seq` is its
/// heartbeat sequence number as known to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEntry {
    /// Canonical peer identity (`host:port`)
    pub id: String,

    /// Heartbeat sequence number for that peer
    pub seq: u64,
}

impl HeartbeatEntry {
    pub fn new(addr: SocketAddr, seq: u64) -> Self {
        Self {
            id: addr.to_string(),
            seq,
        }
    }

    /// Parse the entry's identity back into a socket address.
    ///
    /// Returns `None` for identities that are not in `host:port` form;
    /// such entries are skipped by the receiver rather than failing the
    /// whole payload.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.id.parse().ok()
    }
}

/// A snapshot of the sender's membership view at send time.
///
/// Ordered list of `(id, seq)` pairs; bounded by membership count.
/// There is no delta encoding - every round re-gossips the full view,
/// which is also the recovery mechanism for lost datagrams.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub entries: Vec<HeartbeatEntry>,
}

impl HeartbeatPayload {
    pub fn new(entries: Vec<HeartbeatEntry>) -> Self {
        Self { entries }
    }

    /// Encode the payload for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a payload received from the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let payload = HeartbeatPayload::new(vec![
            HeartbeatEntry::new("127.0.0.1:7946".parse().unwrap(), 42),
            HeartbeatEntry::new("10.0.0.2:7946".parse().unwrap(), 7),
        ]);

        let bytes = payload.to_bytes().unwrap();
        let decoded = HeartbeatPayload::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.entries, payload.entries);
        assert_eq!(decoded.entries[0].id, "127.0.0.1:7946");
        assert_eq!(decoded.entries[1].seq, 7);
    }

    #[test]
    fn test_malformed_payload_rejected() {
        assert!(HeartbeatPayload::from_bytes(b"not json").is_err());
        assert!(HeartbeatPayload::from_bytes(b"{\"entries\": 3}").is_err());
    }

    #[test]
    fn test_bad_identity_skipped_not_fatal() {
        let entry = HeartbeatEntry {
            id: "not-an-address".to_string(),
            seq: 1,
        };
        assert!(entry.addr().is_none());
    }
}
