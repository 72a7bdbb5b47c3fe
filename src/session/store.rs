//! Observable session state.
//!
//! The controller is the only writer. Every publish produces a new
//! immutable `Snapshot` with a strictly increasing revision and delivers it
//! to all subscribers in emission order.
//!
//! Two channels back the store:
//! - a `watch` channel always holding the latest snapshot, for `current()`
//! - a `broadcast` channel carrying every snapshot, for `Subscription`
//!
//! A subscriber that falls more than `capacity` snapshots behind skips the
//! ones it missed and resumes with the oldest still buffered.

use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::warn;

use super::state::SessionState;

/// One published session state.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Position in the publish sequence. Starts at 0 for the initial state.
    pub revision: u64,
    pub state: Arc<SessionState>,
}

impl Deref for Snapshot {
    type Target = SessionState;

    fn deref(&self) -> &SessionState {
        &self.state
    }
}

/// Write side of the store. Owned by the controller.
#[derive(Debug)]
pub struct StateStore {
    revision: u64,
    latest: watch::Sender<Snapshot>,
    stream: broadcast::Sender<Snapshot>,
    reader: StateReader,
}

impl StateStore {
    /// Create a store holding `initial`, buffering up to `capacity`
    /// snapshots per subscriber.
    #[must_use]
    pub fn new(initial: SessionState, capacity: usize) -> Self {
        let snapshot = Snapshot {
            revision: 0,
            state: Arc::new(initial),
        };
        let (latest, latest_rx) = watch::channel(snapshot);
        let (stream, stream_rx) = broadcast::channel(capacity.max(1));

        Self {
            revision: 0,
            latest,
            stream,
            reader: StateReader {
                latest: latest_rx,
                stream: Arc::new(stream_rx),
            },
        }
    }

    /// Publish a new state to every subscriber.
    pub fn publish(&mut self, state: SessionState) -> Snapshot {
        self.revision += 1;
        let snapshot = Snapshot {
            revision: self.revision,
            state: Arc::new(state),
        };

        self.latest.send_replace(snapshot.clone());
        // No live subscribers is fine; the watch side still has the state.
        let _ = self.stream.send(snapshot.clone());
        snapshot
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.latest.borrow().clone()
    }

    /// A cloneable read handle.
    #[must_use]
    pub fn reader(&self) -> StateReader {
        self.reader.clone()
    }
}

/// Read side of the store. Cheap to clone and safe to share across tasks.
#[derive(Clone, Debug)]
pub struct StateReader {
    latest: watch::Receiver<Snapshot>,
    // Template receiver; never read, only resubscribed from.
    stream: Arc<broadcast::Receiver<Snapshot>>,
}

impl StateReader {
    /// The most recently published snapshot.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.latest.borrow().clone()
    }

    /// Subscribe to snapshots.
    ///
    /// The subscription yields the current snapshot first, then every
    /// later one in publish order.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        // Subscribe before reading the latest snapshot so nothing published
        // in between is lost; duplicates are filtered by revision.
        let stream = self.stream.resubscribe();
        let initial = self.current();
        Subscription {
            initial: Some(initial),
            stream,
            last_revision: None,
        }
    }
}

/// Ordered stream of snapshots.
#[derive(Debug)]
pub struct Subscription {
    initial: Option<Snapshot>,
    stream: broadcast::Receiver<Snapshot>,
    last_revision: Option<u64>,
}

impl Subscription {
    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the store has been dropped and every buffered
    /// snapshot has been delivered.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if let Some(snapshot) = self.take_initial() {
            return Some(snapshot);
        }
        loop {
            match self.stream.recv().await {
                Ok(snapshot) => {
                    if let Some(snapshot) = self.accept(snapshot) {
                        return Some(snapshot);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, skipped {} snapshots", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next snapshot if one is already available.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        if let Some(snapshot) = self.take_initial() {
            return Some(snapshot);
        }
        loop {
            match self.stream.try_recv() {
                Ok(snapshot) => {
                    if let Some(snapshot) = self.accept(snapshot) {
                        return Some(snapshot);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Subscriber lagged, skipped {} snapshots", skipped);
                }
                Err(_) => return None,
            }
        }
    }

    /// Wait until a snapshot satisfies `predicate` and return it.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> Option<Snapshot>
    where
        F: FnMut(&SessionState) -> bool,
    {
        while let Some(snapshot) = self.next().await {
            if predicate(&snapshot) {
                return Some(snapshot);
            }
        }
        None
    }

    fn take_initial(&mut self) -> Option<Snapshot> {
        let snapshot = self.initial.take()?;
        self.last_revision = Some(snapshot.revision);
        Some(snapshot)
    }

    fn accept(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        if self
            .last_revision
            .is_some_and(|last| snapshot.revision <= last)
        {
            return None;
        }
        self.last_revision = Some(snapshot.revision);
        Some(snapshot)
    }
}
