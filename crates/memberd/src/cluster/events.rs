//! Member event callbacks.
//!
//! Four independently optional registrations, invoked synchronously on
//! whichever loop detected the transition. A callback that panics is
//! caught and logged; it never takes the owning loop down with it.

use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

/// Callback invoked with the affected peer's address
pub type MemberCallback = Arc<dyn Fn(SocketAddr) + Send + Sync>;

/// Late-bound event handler registry owned by the node manager.
///
/// Registration is effective immediately, including after `start()`.
#[derive(Default)]
pub struct EventHandlers {
    on_joined: RwLock<Option<MemberCallback>>,
    on_failed: RwLock<Option<MemberCallback>>,
    on_revived: RwLock<Option<MemberCallback>>,
    on_removed: RwLock<Option<MemberCallback>>,
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers").finish_non_exhaustive()
    }
}

impl EventHandlers {
    pub fn set_on_member_joined(&self, callback: MemberCallback) {
        if let Ok(mut slot) = self.on_joined.write() {
            *slot = Some(callback);
        }
    }

    pub fn set_on_member_failed(&self, callback: MemberCallback) {
        if let Ok(mut slot) = self.on_failed.write() {
            *slot = Some(callback);
        }
    }

    pub fn set_on_member_revived(&self, callback: MemberCallback) {
        if let Ok(mut slot) = self.on_revived.write() {
            *slot = Some(callback);
        }
    }

    pub fn set_on_member_removed(&self, callback: MemberCallback) {
        if let Ok(mut slot) = self.on_removed.write() {
            *slot = Some(callback);
        }
    }

    pub fn member_joined(&self, addr: SocketAddr) {
        self.fire(&self.on_joined, "joined", addr);
    }

    pub fn member_failed(&self, addr: SocketAddr) {
        self.fire(&self.on_failed, "failed", addr);
    }

    pub fn member_revived(&self, addr: SocketAddr) {
        self.fire(&self.on_revived, "revived", addr);
    }

    pub fn member_removed(&self, addr: SocketAddr) {
        self.fire(&self.on_removed, "removed", addr);
    }

    fn fire(&self, slot: &RwLock<Option<MemberCallback>>, event: &str, addr: SocketAddr) {
        // Clone the handler out of the lock before invoking, so a
        // panicking callback cannot poison the registration slot.
        let callback = match slot.read() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };

        if let Some(callback) = callback
            && catch_unwind(AssertUnwindSafe(|| callback(addr))).is_err()
        {
            tracing::warn!(event, peer = %addr, "member event callback panicked");
        }
    }
}
