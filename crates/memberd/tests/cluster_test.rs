//! End-to-end membership tests over real loopback UDP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use memberd::cluster::NodeManager;
use memberd::config::NodeConfig;

fn fast_config() -> NodeConfig {
    NodeConfig {
        failure_timeout_ms: 600,
        cleanup_timeout_ms: 400,
        gossip_interval_ms: 100,
        detection_interval_ms: 100,
        fanout: 3,
    }
}

/// Poll `condition` until it holds or the deadline passes.
async fn wait_for(what: &str, deadline: Duration, mut condition: impl FnMut() -> bool) {
    let start = tokio::time::Instant::now();
    while !condition() {
        if start.elapsed() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

async fn spawn_node(seed: Option<SocketAddr>) -> Arc<NodeManager> {
    let manager = NodeManager::new("127.0.0.1:0".parse().unwrap(), seed, fast_config())
        .await
        .expect("node construction failed");
    let manager = Arc::new(manager);
    manager.start();
    manager
}

#[tokio::test]
async fn test_joiner_is_discovered_by_seed() {
    let seed = spawn_node(None).await;

    let joined = Arc::new(AtomicUsize::new(0));
    let joined_clone = joined.clone();
    seed.on_member_joined(move |_| {
        joined_clone.fetch_add(1, Ordering::SeqCst);
    });

    let joiner = spawn_node(Some(seed.self_addr())).await;

    // The joiner's first heartbeat introduces it to the seed
    wait_for("seed to discover joiner", Duration::from_secs(5), || {
        seed.view().contains(&joiner.self_addr())
    })
    .await;

    // The seed's heartbeats flow back; both views converge to 2 members
    wait_for("joiner to hear from seed", Duration::from_secs(5), || {
        joiner.view().len() == 2 && joiner.alive_members().len() == 2
    })
    .await;

    // Give a few more gossip rounds a chance to re-deliver the same
    // view; the joined event must stay at one
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(joined.load(Ordering::SeqCst), 1);

    joiner.stop().await;
    seed.stop().await;
}

#[tokio::test]
async fn test_silent_peer_is_failed_then_removed() {
    let seed = spawn_node(None).await;

    let failed = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicUsize::new(0));
    let failed_clone = failed.clone();
    let removed_clone = removed.clone();
    seed.on_member_failed(move |_| {
        failed_clone.fetch_add(1, Ordering::SeqCst);
    });
    seed.on_member_removed(move |_| {
        removed_clone.fetch_add(1, Ordering::SeqCst);
    });

    let joiner = spawn_node(Some(seed.self_addr())).await;
    let joiner_addr = joiner.self_addr();

    wait_for("seed to discover joiner", Duration::from_secs(5), || {
        seed.view().contains(&joiner_addr)
    })
    .await;

    // Joiner goes silent
    joiner.stop().await;

    wait_for("seed to declare joiner failed", Duration::from_secs(5), || {
        failed.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(seed.failed_members().contains(&joiner_addr));

    wait_for("seed to remove joiner", Duration::from_secs(5), || {
        removed.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(!seed.view().contains(&joiner_addr));

    // Subsequent sweeps must not re-fire either event
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(failed.load(Ordering::SeqCst), 1);
    assert_eq!(removed.load(Ordering::SeqCst), 1);

    seed.stop().await;
}

#[tokio::test]
async fn test_callbacks_registered_after_start_take_effect() {
    let seed = spawn_node(None).await;

    // Registration after start() is effective immediately
    let joined = Arc::new(AtomicUsize::new(0));
    let joined_clone = joined.clone();
    seed.on_member_joined(move |_| {
        joined_clone.fetch_add(1, Ordering::SeqCst);
    });

    let joiner = spawn_node(Some(seed.self_addr())).await;

    wait_for("joined event on seed", Duration::from_secs(5), || {
        joined.load(Ordering::SeqCst) == 1
    })
    .await;

    joiner.stop().await;
    seed.stop().await;
}
