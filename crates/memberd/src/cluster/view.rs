//! Concurrent membership view.
//!
//! One `MembershipView` per node, shared by the sender, receiver, and
//! failure-detector loops. Backed by a [`DashMap`] so merges are atomic
//! per key and a detector sweep never serializes behind a sender
//! snapshot. Causal recency is carried entirely by the heartbeat
//! sequence number: max-sequence-wins, never decreasing.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Per-peer membership state.
///
/// `failed` is mutated exclusively by the failure detector; the
/// receiver only ever refreshes `seq` and `last_contact` through
/// [`MembershipView::merge`].
#[derive(Debug, Clone)]
pub struct MemberRecord {
    /// Canonical peer identity, immutable after creation
    pub addr: SocketAddr,

    /// Heartbeat sequence number; advances only via self-increment or
    /// merge-with-max
    pub seq: u64,

    /// Last time this record was created or had its sequence advance
    pub last_contact: Instant,

    /// Liveness flag, owned by the failure detector
    pub failed: bool,

    /// Wall-clock time the record entered this view (status reporting only)
    pub joined_at: DateTime<Utc>,
}

impl MemberRecord {
    fn new(addr: SocketAddr, seq: u64) -> Self {
        Self {
            addr,
            seq,
            last_contact: Instant::now(),
            failed: false,
            joined_at: Utc::now(),
        }
    }
}

/// Result of reconciling a remote `(id, seq)` observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The peer was unknown and a record was created
    Added,
    /// The record existed and the remote sequence was fresher
    Advanced,
    /// The remote sequence was lower or equal; nothing changed
    Stale,
}

/// A liveness transition observed during a detector sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessEdge {
    /// Alive -> Failed
    Failed,
    /// Failed -> Alive (fresh contact arrived before cleanup)
    Revived,
}

/// Concurrent table of member records keyed by peer address.
///
/// Always contains an entry for self; self is never flagged failed and
/// never removed.
#[derive(Debug)]
pub struct MembershipView {
    self_addr: SocketAddr,
    members: DashMap<SocketAddr, MemberRecord>,
}

impl MembershipView {
    /// Create a view seeded with self at sequence 0.
    pub fn new(self_addr: SocketAddr) -> Self {
        let members = DashMap::new();
        members.insert(self_addr, MemberRecord::new(self_addr, 0));
        Self { self_addr, members }
    }

    pub fn self_addr(&self) -> SocketAddr {
        self.self_addr
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.members.contains_key(addr)
    }

    /// Insert a record iff the address is absent. Never overwrites.
    pub fn add_if_absent(&self, addr: SocketAddr, seq: u64) -> bool {
        match self.members.entry(addr) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(MemberRecord::new(addr, seq));
                true
            }
        }
    }

    /// Reconcile one remote observation, atomically for this key.
    ///
    /// Unknown peers are created at `remote_seq` (this is how new
    /// members join a view). Known peers advance only when the remote
    /// sequence is strictly greater, which also resets `last_contact`.
    /// A stale observation changes nothing, `last_contact` included.
    /// The `failed` flag is never touched here; reclassification is the
    /// detector's job.
    pub fn merge(&self, addr: SocketAddr, remote_seq: u64) -> MergeOutcome {
        if addr == self.self_addr {
            // Self advances only through bump_self
            return MergeOutcome::Stale;
        }

        match self.members.entry(addr) {
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if remote_seq > record.seq {
                    record.seq = remote_seq;
                    record.last_contact = Instant::now();
                    MergeOutcome::Advanced
                } else {
                    MergeOutcome::Stale
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MemberRecord::new(addr, remote_seq));
                MergeOutcome::Added
            }
        }
    }

    /// Delete a record. Idempotent; refuses to remove self.
    pub fn remove(&self, addr: &SocketAddr) {
        if *addr == self.self_addr {
            return;
        }
        self.members.remove(addr);
    }

    /// Point-in-time `(addr, seq)` list over all current records.
    ///
    /// Tolerant of concurrent mutation: an entry added or removed
    /// mid-iteration may or may not appear.
    pub fn snapshot(&self) -> Vec<(SocketAddr, u64)> {
        self.members
            .iter()
            .map(|entry| (entry.value().addr, entry.value().seq))
            .collect()
    }

    /// All current non-self peer addresses.
    pub fn peer_addrs(&self) -> Vec<SocketAddr> {
        self.members
            .iter()
            .map(|entry| *entry.key())
            .filter(|addr| *addr != self.self_addr)
            .collect()
    }

    /// Atomically increment self's sequence and refresh its contact
    /// time. Called once at the top of every gossip round.
    pub fn bump_self(&self) -> u64 {
        match self.members.get_mut(&self.self_addr) {
            Some(mut record) => {
                record.seq += 1;
                record.last_contact = Instant::now();
                record.seq
            }
            None => {
                // Self is seeded at construction and remove() refuses it
                tracing::error!("self record missing from membership view");
                0
            }
        }
    }

    /// Recompute a non-self record's liveness from elapsed contact time
    /// and report the edge, if any, against its previous flag.
    ///
    /// The flag flip and the comparison happen under the key's entry
    /// lock, so concurrent sweeps cannot observe the same edge twice.
    pub fn evaluate_liveness(
        &self,
        addr: &SocketAddr,
        now: Instant,
        failure_timeout: Duration,
    ) -> Option<LivenessEdge> {
        if *addr == self.self_addr {
            return None;
        }

        let mut record = self.members.get_mut(addr)?;
        let failed_now = now.duration_since(record.last_contact) >= failure_timeout;

        if failed_now == record.failed {
            return None;
        }

        record.failed = failed_now;
        Some(if failed_now {
            LivenessEdge::Failed
        } else {
            LivenessEdge::Revived
        })
    }

    /// Remove a record that has been failed past the cleanup grace
    /// period. The elapsed condition is re-checked under the entry
    /// lock, so a merge that revives the peer between the caller's
    /// sweep and this call cancels the removal.
    pub fn remove_if_expired(
        &self,
        addr: &SocketAddr,
        now: Instant,
        removal_timeout: Duration,
    ) -> bool {
        if *addr == self.self_addr {
            return false;
        }

        self.members
            .remove_if(addr, |_, record| {
                record.failed && now.duration_since(record.last_contact) >= removal_timeout
            })
            .is_some()
    }

    /// Addresses currently alive, self included.
    pub fn alive_members(&self) -> Vec<SocketAddr> {
        self.members
            .iter()
            .filter(|entry| !entry.value().failed)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Addresses currently flagged failed.
    pub fn failed_members(&self) -> Vec<SocketAddr> {
        self.members
            .iter()
            .filter(|entry| entry.value().failed)
            .map(|entry| *entry.key())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn record(&self, addr: &SocketAddr) -> Option<MemberRecord> {
        self.members.get(addr).map(|entry| entry.value().clone())
    }
}
