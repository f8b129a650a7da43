//! Shared protocol constants for memberd components.

/// Default UDP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7946";

/// Default time without contact before a peer is declared failed (ms)
pub const DEFAULT_FAILURE_TIMEOUT_MS: u64 = 4_000;

/// Default grace period after failure before a peer is removed (ms)
pub const DEFAULT_CLEANUP_TIMEOUT_MS: u64 = 3_000;

/// Default interval between gossip rounds (ms)
pub const DEFAULT_GOSSIP_INTERVAL_MS: u64 = 1_000;

/// Default interval between failure-detector sweeps (ms)
pub const DEFAULT_DETECTION_INTERVAL_MS: u64 = 500;

/// Default number of peers contacted per gossip round
pub const DEFAULT_FANOUT: usize = 3;

/// Maximum heartbeat datagram size accepted by the receiver
pub const MAX_DATAGRAM_SIZE: usize = 65_536;
