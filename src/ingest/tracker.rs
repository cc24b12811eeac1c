use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

/// Counts in-flight fragment admissions per session so end-of-recording can
/// wait for trailing uploads to land instead of sleeping a fixed interval.
///
/// The coordinator transitions the session out of `Recording` first (so no
/// new admissions start), then waits here for the in-flight count to drain.
#[derive(Clone, Default)]
pub struct UploadTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Default)]
struct TrackerInner {
    counters: Mutex<HashMap<Uuid, Arc<AtomicUsize>>>,
    drained: Notify,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one admission. The count drops when the returned guard is
    /// dropped, whether the admission succeeded or failed.
    pub async fn begin(&self, session_id: Uuid) -> UploadGuard {
        let counter = {
            let mut counters = self.inner.counters.lock().await;
            Arc::clone(counters.entry(session_id).or_default())
        };
        counter.fetch_add(1, Ordering::SeqCst);

        UploadGuard {
            inner: Arc::clone(&self.inner),
            counter,
        }
    }

    pub async fn in_flight(&self, session_id: Uuid) -> usize {
        let counters = self.inner.counters.lock().await;
        counters
            .get(&session_id)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Wait until no admissions are in flight for the session, or until the
    /// deadline passes. Returns whether the session actually drained.
    pub async fn wait_idle(&self, session_id: Uuid, deadline: Duration) -> bool {
        let drained = async {
            loop {
                // Register for the wakeup before checking, so a guard dropped
                // between the check and the await is not missed.
                let notified = self.inner.drained.notified();
                if self.in_flight(session_id).await == 0 {
                    break;
                }
                notified.await;
            }
        };

        tokio::time::timeout(deadline, drained).await.is_ok()
    }

    /// Drop bookkeeping for a deleted session.
    pub async fn forget(&self, session_id: Uuid) {
        let mut counters = self.inner.counters.lock().await;
        counters.remove(&session_id);
    }
}

pub struct UploadGuard {
    inner: Arc<TrackerInner>,
    counter: Arc<AtomicUsize>,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        self.inner.drained.notify_waiters();
    }
}
