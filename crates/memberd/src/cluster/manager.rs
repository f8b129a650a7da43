//! Node orchestration.
//!
//! The `NodeManager` owns the membership view, the event registry, the
//! transport, and the lifecycle of the three protocol loops. A node
//! starts either as a seed (no existing peer) or as a joiner with one
//! bootstrap peer address.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use memberd_common::Result;

use super::detector::FailureDetector;
use super::events::EventHandlers;
use super::receiver::GossipReceiver;
use super::sender::GossipSender;
use super::view::MembershipView;
use crate::config::NodeConfig;
use crate::transport::UdpTransport;

/// Delay before the post-start member status report
const STATUS_REPORT_DELAY: Duration = Duration::from_millis(2_500);

/// Owns the membership view and runs the gossip protocol loops
#[derive(Debug)]
pub struct NodeManager {
    config: NodeConfig,
    view: Arc<MembershipView>,
    transport: Arc<UdpTransport>,
    events: Arc<EventHandlers>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeManager {
    /// Create a node bound to `listen_addr`, optionally seeded with one
    /// bootstrap peer. Invalid configuration aborts construction; it is
    /// the only fatal error class.
    pub async fn new(
        listen_addr: SocketAddr,
        seed_peer: Option<SocketAddr>,
        config: NodeConfig,
    ) -> Result<Self> {
        config.validate()?;

        let transport = Arc::new(UdpTransport::bind(listen_addr).await?);
        // Identity is the bound address, so port 0 resolves first
        let view = Arc::new(MembershipView::new(transport.local_addr()));

        if let Some(peer) = seed_peer {
            view.add_if_absent(peer, 0);
            tracing::info!(peer = %peer, "Seeded bootstrap peer");
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            view,
            transport,
            events: Arc::new(EventHandlers::default()),
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// The address this node is known by in the cluster.
    pub fn self_addr(&self) -> SocketAddr {
        self.view.self_addr()
    }

    pub fn view(&self) -> &Arc<MembershipView> {
        &self.view
    }

    /// Peers currently considered alive, self included.
    pub fn alive_members(&self) -> Vec<SocketAddr> {
        self.view.alive_members()
    }

    /// Peers currently flagged failed.
    pub fn failed_members(&self) -> Vec<SocketAddr> {
        self.view.failed_members()
    }

    /// Register a callback for newly discovered members.
    pub fn on_member_joined(&self, callback: impl Fn(SocketAddr) + Send + Sync + 'static) {
        self.events.set_on_member_joined(Arc::new(callback));
    }

    /// Register a callback for Alive -> Failed transitions.
    pub fn on_member_failed(&self, callback: impl Fn(SocketAddr) + Send + Sync + 'static) {
        self.events.set_on_member_failed(Arc::new(callback));
    }

    /// Register a callback for Failed -> Alive transitions.
    pub fn on_member_revived(&self, callback: impl Fn(SocketAddr) + Send + Sync + 'static) {
        self.events.set_on_member_revived(Arc::new(callback));
    }

    /// Register a callback for cleanup removals.
    pub fn on_member_removed(&self, callback: impl Fn(SocketAddr) + Send + Sync + 'static) {
        self.events.set_on_member_removed(Arc::new(callback));
    }

    /// Launch the sender, receiver, and failure-detector loops.
    ///
    /// The three loops run independently against the shared view;
    /// callback registration stays open and is effective immediately.
    pub fn start(&self) {
        tracing::info!(
            addr = %self.self_addr(),
            members = self.view.len(),
            "🫀 Starting membership node"
        );

        let sender = GossipSender::new(
            self.view.clone(),
            self.transport.clone(),
            self.config.clone(),
        );
        let receiver = GossipReceiver::new(
            self.view.clone(),
            self.transport.clone(),
            self.events.clone(),
        );
        let detector = FailureDetector::new(
            self.view.clone(),
            self.events.clone(),
            self.config.clone(),
        );

        let mut handles = match self.handles.lock() {
            Ok(handles) => handles,
            Err(poisoned) => poisoned.into_inner(),
        };
        handles.push(tokio::spawn(sender.run(self.shutdown_tx.subscribe())));
        handles.push(tokio::spawn(receiver.run(self.shutdown_tx.subscribe())));
        handles.push(tokio::spawn(detector.run(self.shutdown_tx.subscribe())));

        // Post-start health report, once the first rounds have landed
        let view = self.view.clone();
        let mut shutdown = self.shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(STATUS_REPORT_DELAY) => {}
                _ = shutdown.recv() => return,
            }
            for addr in view.alive_members() {
                tracing::info!(peer = %addr, status = "alive", "Health status");
            }
            for addr in view.failed_members() {
                tracing::info!(peer = %addr, status = "failed", "Health status");
            }
        }));
    }

    /// Cooperative shutdown: each loop observes the signal at the top
    /// of its next cycle, so stop latency is bounded by one interval.
    /// In-flight sends are not cancelled.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(());

        let handles = {
            let mut guard = match self.handles.lock() {
                Ok(handles) => handles,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *guard)
        };

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Protocol loop ended abnormally");
            }
        }

        tracing::info!(addr = %self.self_addr(), "Membership node stopped");
    }
}
