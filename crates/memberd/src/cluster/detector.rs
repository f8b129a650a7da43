//! Failure detection sweep.
//!
//! Per non-self record: Alive -> Failed once `failure_timeout` elapses
//! without contact, Failed -> Removed once the cleanup grace elapses on
//! top of that, Failed -> Alive if a merge refreshes contact first.
//! All liveness transitions happen here and only here - the receiver
//! refreshes contact times but never flips the flag, so every edge is
//! observed exactly once.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

use super::events::EventHandlers;
use super::view::{LivenessEdge, MembershipView};
use crate::config::NodeConfig;

/// Periodic liveness sweep over the shared membership view
pub struct FailureDetector {
    view: Arc<MembershipView>,
    events: Arc<EventHandlers>,
    config: NodeConfig,
}

impl FailureDetector {
    pub fn new(view: Arc<MembershipView>, events: Arc<EventHandlers>, config: NodeConfig) -> Self {
        Self {
            view,
            events,
            config,
        }
    }

    /// Run sweeps every detection interval until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let interval = self.config.detection_interval();

        tracing::info!(?interval, "Failure detector started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.sweep(Instant::now());
                }
                _ = shutdown.recv() => {
                    tracing::info!("Failure detector shutting down");
                    break;
                }
            }
        }
    }

    /// One sweep over all non-self records, evaluated against `now`.
    ///
    /// Edge detection and cleanup are independent checks: a record can
    /// fire its failed edge and, on a later sweep, its removal. Only
    /// edges fire callbacks - steady states fire nothing.
    pub fn sweep(&self, now: Instant) {
        let failure_timeout = self.config.failure_timeout();
        let removal_timeout = self.config.removal_timeout();

        for addr in self.view.peer_addrs() {
            match self.view.evaluate_liveness(&addr, now, failure_timeout) {
                Some(LivenessEdge::Failed) => {
                    tracing::warn!(peer = %addr, "Peer declared failed (no contact)");
                    self.events.member_failed(addr);
                }
                Some(LivenessEdge::Revived) => {
                    tracing::info!(peer = %addr, "Peer revived");
                    self.events.member_revived(addr);
                }
                None => {}
            }

            if self.view.remove_if_expired(&addr, now, removal_timeout) {
                tracing::info!(peer = %addr, "Peer removed after cleanup grace");
                self.events.member_removed(addr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn test_config() -> NodeConfig {
        NodeConfig {
            failure_timeout_ms: 4_000,
            cleanup_timeout_ms: 3_000,
            ..Default::default()
        }
    }

    struct Counters {
        failed: AtomicUsize,
        revived: AtomicUsize,
        removed: AtomicUsize,
    }

    fn detector_with_counters() -> (FailureDetector, Arc<MembershipView>, Arc<Counters>) {
        let view = Arc::new(MembershipView::new(addr(9000)));
        let events = Arc::new(EventHandlers::default());
        let counters = Arc::new(Counters {
            failed: AtomicUsize::new(0),
            revived: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        });

        let c = counters.clone();
        events.set_on_member_failed(Arc::new(move |_| {
            c.failed.fetch_add(1, Ordering::SeqCst);
        }));
        let c = counters.clone();
        events.set_on_member_revived(Arc::new(move |_| {
            c.revived.fetch_add(1, Ordering::SeqCst);
        }));
        let c = counters.clone();
        events.set_on_member_removed(Arc::new(move |_| {
            c.removed.fetch_add(1, Ordering::SeqCst);
        }));

        let detector = FailureDetector::new(view.clone(), events, test_config());
        (detector, view, counters)
    }

    #[test]
    fn test_fresh_peer_stays_alive() {
        let (detector, view, counters) = detector_with_counters();
        view.merge(addr(9001), 1);

        detector.sweep(Instant::now());
        detector.sweep(Instant::now() + Duration::from_secs(3));

        assert_eq!(counters.failed.load(Ordering::SeqCst), 0);
        assert!(view.contains(&addr(9001)));
    }

    #[test]
    fn test_failed_edge_fires_exactly_once() {
        let (detector, view, counters) = detector_with_counters();
        view.merge(addr(9001), 1);

        let t4 = Instant::now() + Duration::from_secs(4);
        detector.sweep(t4);
        detector.sweep(t4 + Duration::from_millis(500));
        detector.sweep(t4 + Duration::from_secs(1));

        assert_eq!(counters.failed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 0);
        assert!(view.contains(&addr(9001)));
    }

    #[test]
    fn test_revival_after_fresh_contact() {
        let (detector, view, counters) = detector_with_counters();
        view.merge(addr(9001), 1);

        detector.sweep(Instant::now() + Duration::from_secs(5));
        assert_eq!(counters.failed.load(Ordering::SeqCst), 1);

        // Heartbeat resumes: the merge advances contact, the next
        // sweep flips the record back
        view.merge(addr(9001), 2);
        detector.sweep(Instant::now());
        detector.sweep(Instant::now());

        assert_eq!(counters.revived.load(Ordering::SeqCst), 1);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_removal_after_cleanup_grace() {
        let (detector, view, counters) = detector_with_counters();
        view.merge(addr(9001), 1);

        let start = Instant::now();
        detector.sweep(start + Duration::from_secs(4));
        // 4s + 3s since last contact: failed long enough to clean up
        detector.sweep(start + Duration::from_secs(7));
        detector.sweep(start + Duration::from_secs(8));

        assert_eq!(counters.failed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 1);
        assert!(!view.contains(&addr(9001)));
    }

    #[test]
    fn test_failed_and_removed_can_land_in_one_sweep() {
        let (detector, view, counters) = detector_with_counters();
        view.merge(addr(9001), 1);

        // First sweep only happens after both thresholds elapsed
        detector.sweep(Instant::now() + Duration::from_secs(10));

        assert_eq!(counters.failed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 1);
        assert!(!view.contains(&addr(9001)));
    }

    #[test]
    fn test_self_never_fails_or_gets_removed() {
        let (detector, view, counters) = detector_with_counters();

        detector.sweep(Instant::now() + Duration::from_secs(3600));

        assert_eq!(counters.failed.load(Ordering::SeqCst), 0);
        assert_eq!(counters.removed.load(Ordering::SeqCst), 0);
        assert!(view.contains(&addr(9000)));
    }
}
