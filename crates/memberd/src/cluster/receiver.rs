//! Gossip receiver loop.
//!
//! Blocks on the transport and merges every arriving view snapshot
//! into the shared membership table. Merges refresh sequence numbers
//! and contact times only; liveness reclassification stays with the
//! failure detector so each transition has exactly one source.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

use memberd_common::HeartbeatPayload;
use memberd_common::constants::MAX_DATAGRAM_SIZE;

use super::events::EventHandlers;
use super::view::{MembershipView, MergeOutcome};
use crate::transport::UdpTransport;

/// Continuous inbound heartbeat processing
pub struct GossipReceiver {
    view: Arc<MembershipView>,
    transport: Arc<UdpTransport>,
    events: Arc<EventHandlers>,
}

impl GossipReceiver {
    pub fn new(
        view: Arc<MembershipView>,
        transport: Arc<UdpTransport>,
        events: Arc<EventHandlers>,
    ) -> Self {
        Self {
            view,
            transport,
            events,
        }
    }

    /// Receive datagrams until shutdown. Transport errors are logged
    /// and the loop moves on to the next receive; they are never fatal.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        tracing::info!(addr = %self.transport.local_addr(), "Gossip receiver started");

        loop {
            tokio::select! {
                result = self.transport.recv(&mut buf) => {
                    match result {
                        Ok((len, src)) => self.handle_datagram(&buf[..len], src),
                        Err(e) => {
                            tracing::warn!(error = %e, "Heartbeat receive error");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Gossip receiver shutting down");
                    break;
                }
            }
        }
    }

    /// Decode one datagram; undecodable payloads are dropped whole.
    fn handle_datagram(&self, data: &[u8], src: SocketAddr) {
        let payload = match HeartbeatPayload::from_bytes(data) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(src = %src, error = %e, "Dropping undecodable heartbeat");
                return;
            }
        };

        tracing::trace!(src = %src, entries = payload.entries.len(), "Received heartbeat");
        self.apply(payload);
    }

    /// Merge a decoded payload into the view, entry by entry.
    ///
    /// Self entries are ignored (self advances only locally); entries
    /// whose identity does not parse are skipped individually.
    pub fn apply(&self, payload: HeartbeatPayload) {
        for entry in payload.entries {
            let Some(addr) = entry.addr() else {
                tracing::warn!(id = %entry.id, "Skipping heartbeat entry with invalid identity");
                continue;
            };

            if addr == self.view.self_addr() {
                continue;
            }

            if self.view.merge(addr, entry.seq) == MergeOutcome::Added {
                tracing::info!(peer = %addr, "Discovered new member");
                self.events.member_joined(addr);
            }
        }
    }
}
