//! # Memberd
//!
//! Decentralized cluster membership via gossip-style heartbeat
//! dissemination and local failure detection. Each node independently
//! tracks which peers are alive, periodically exchanges its view with
//! a random subset of peers over UDP, and infers peer liveness from
//! elapsed time since last contact - no central coordinator.
//!
//! ## Modules
//! - `cluster` - membership view, gossip loops, failure detector
//! - `config` - protocol configuration
//! - `transport` - best-effort UDP datagram transport

pub mod cluster;
pub mod config;
pub mod transport;

pub use cluster::NodeManager;
pub use config::NodeConfig;
