//! Gossip sender rounds.
//!
//! Every gossip interval: bump self's sequence, pick a bounded random
//! subset of peers, and fan the current view snapshot out to them over
//! UDP. Sends are fire-and-forget and run concurrently; one slow or
//! failing target never holds back the others. Bounding each round to
//! `fanout` targets keeps per-node outbound traffic O(fanout) as the
//! cluster grows.

use futures::future::join_all;
use rand::seq::SliceRandom;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;

use memberd_common::{HeartbeatEntry, HeartbeatPayload};

use super::view::MembershipView;
use crate::config::NodeConfig;
use crate::transport::UdpTransport;

/// Periodic heartbeat dissemination over the shared membership view
pub struct GossipSender {
    view: Arc<MembershipView>,
    transport: Arc<UdpTransport>,
    config: NodeConfig,
}

impl GossipSender {
    pub fn new(
        view: Arc<MembershipView>,
        transport: Arc<UdpTransport>,
        config: NodeConfig,
    ) -> Self {
        Self {
            view,
            transport,
            config,
        }
    }

    /// Run gossip rounds every interval until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.gossip_interval();

        tracing::info!(?interval, fanout = self.config.fanout, "Gossip sender started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.round().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Gossip sender shutting down");
                    break;
                }
            }
        }
    }

    /// One gossip round: bump self, sample targets, send the snapshot.
    async fn round(&self) {
        let seq = self.view.bump_self();
        let targets = select_targets(self.view.peer_addrs(), self.config.fanout);
        if targets.is_empty() {
            return;
        }

        let entries = self
            .view
            .snapshot()
            .into_iter()
            .map(|(addr, seq)| HeartbeatEntry::new(addr, seq))
            .collect();
        let bytes = match HeartbeatPayload::new(entries).to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode heartbeat payload");
                return;
            }
        };

        let transport = &self.transport;
        let bytes = &bytes;
        let sends = targets.iter().map(|target| async move {
            if let Err(e) = transport.send(*target, bytes).await {
                tracing::warn!(peer = %target, error = %e, "Failed to send heartbeat");
            }
        });
        join_all(sends).await;

        tracing::debug!(seq, targets = targets.len(), "Gossip round complete");
    }
}

/// Sample gossip targets for one round.
///
/// All peers when the population fits in the fanout, otherwise exactly
/// `fanout` distinct peers via partial shuffle - no reject-and-retry,
/// so high fanout-to-population ratios cost the same as low ones.
pub fn select_targets(mut peers: Vec<SocketAddr>, fanout: usize) -> Vec<SocketAddr> {
    if peers.len() <= fanout {
        return peers;
    }

    let mut rng = rand::rng();
    let (chosen, _) = peers.partial_shuffle(&mut rng, fanout);
    chosen.to_vec()
}
