//! Cancellable live feed of full-collection snapshots.

use crate::model::note::NoteSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Live snapshot feed returned by `NoteStore::subscribe`.
///
/// The first `next()` resolves with the current collection as soon as it
/// is known; later calls resolve after each change. A consumer that falls
/// behind skips straight to the newest full snapshot. Dropping or calling
/// `cancel()` deregisters the feed and stops any background polling.
pub struct Subscription {
    rx: watch::Receiver<Option<NoteSnapshot>>,
    feeder: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps a snapshot channel. `None` marks "not loaded yet".
    pub(crate) fn new(
        mut rx: watch::Receiver<Option<NoteSnapshot>>,
        feeder: Option<JoinHandle<()>>,
    ) -> Self {
        rx.mark_changed();
        Self { rx, feeder }
    }

    /// Waits for the next full snapshot.
    ///
    /// Returns `None` once the feed has ended (store dropped or poller
    /// stopped) and every published snapshot was consumed.
    pub async fn next(&mut self) -> Option<NoteSnapshot> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(snapshot) = self.rx.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }

    /// Returns the most recent snapshot without waiting.
    pub fn latest(&self) -> Option<NoteSnapshot> {
        self.rx.borrow().clone()
    }

    /// Deregisters the feed; no further deliveries happen.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("polling", &self.feeder.is_some())
            .finish()
    }
}
