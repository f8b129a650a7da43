//! Cluster membership modules.
//!
//! Implements:
//! - Concurrent membership view with monotonic-sequence merges
//! - Failure detection (alive -> failed -> removed, with revival)
//! - Gossip dissemination (random-fanout heartbeat rounds over UDP)

mod detector;
mod events;
mod manager;
mod receiver;
mod sender;
mod view;

pub use detector::FailureDetector;
pub use events::{EventHandlers, MemberCallback};
pub use manager::NodeManager;
pub use receiver::GossipReceiver;
pub use sender::{GossipSender, select_targets};
pub use view::{LivenessEdge, MemberRecord, MembershipView, MergeOutcome};
