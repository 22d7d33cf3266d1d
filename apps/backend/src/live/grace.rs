//! Reconnect grace tracker: delayed removal of dropped players.
//!
//! Each disconnected player gets one pending-removal timer. Arming a new
//! timer for a connection replaces any prior one; a reconnect cancels it.
//! Expiry and cancellation race against each other, so the timer claims its
//! own entry atomically (generation-checked `remove_if`) before running the
//! removal. A cancel always targets the current timer, never a stale one,
//! and a claimed entry can fire at most once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::live::registry::ConnId;

struct PendingDisconnect {
    pin: String,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

#[derive(Default)]
pub struct GraceTracker {
    pending: Arc<DashMap<ConnId, PendingDisconnect>>,
    generations: AtomicU64,
}

impl GraceTracker {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Arm (or re-arm) the removal timer for a dropped connection.
    ///
    /// `on_expiry` runs only if this exact timer is still the armed one
    /// when the window elapses.
    pub fn arm<F>(&self, conn_id: ConnId, pin: String, window: Duration, on_expiry: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some((_, previous)) = self.pending.remove(&conn_id) {
            previous.abort();
        }

        // Insert before spawning so a zero-length window cannot fire
        // against a missing entry.
        self.pending.insert(
            conn_id,
            PendingDisconnect {
                pin,
                generation,
                handle: None,
            },
        );

        let pending = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let claimed = pending
                .remove_if(&conn_id, |_, entry| entry.generation == generation)
                .is_some();
            if claimed {
                on_expiry();
            } else {
                debug!(conn_id = %conn_id, "grace timer lost the claim race");
            }
        });

        if let Some(mut entry) = self.pending.get_mut(&conn_id) {
            if entry.generation == generation {
                entry.handle = Some(handle);
            }
        }
    }

    /// Cancel a pending removal, returning the PIN it was armed for.
    pub fn cancel(&self, conn_id: ConnId) -> Option<String> {
        let (_, entry) = self.pending.remove(&conn_id)?;
        let pin = entry.pin.clone();
        entry.abort();
        Some(pin)
    }

    pub fn is_pending(&self, conn_id: ConnId) -> bool {
        self.pending.contains_key(&conn_id)
    }
}

impl PendingDisconnect {
    fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
