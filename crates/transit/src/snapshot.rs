//! Published snapshots of the realtime state.
//!
//! A refresh builds a whole new [`Snapshot`] and swaps it in through a watch
//! channel. Readers take an `Arc` to the current snapshot and answer from it
//! without holding any lock; a snapshot is never modified once published.

use std::sync::Arc;

use tokio::sync::watch;

use crate::board::StopBoard;
use crate::catalog::StopCatalog;
use crate::refresh::CycleReport;
use crate::vehicles::VehicleRegistry;

/// One complete, internally consistent view of catalog, arrivals and vehicles.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Increases by one with every publish
    pub version: u64,
    /// Epoch seconds the snapshot was built at
    pub built_at: i64,
    pub catalog: Arc<StopCatalog>,
    pub board: StopBoard,
    pub registry: Arc<VehicleRegistry>,
    pub report: CycleReport,
}

impl Snapshot {
    /// A snapshot with empty arrival indexes for `catalog` and no vehicles.
    pub fn from_catalog(catalog: StopCatalog, built_at: i64) -> Self {
        let board = StopBoard::from_catalog(&catalog);
        Self {
            version: 1,
            built_at,
            catalog: Arc::new(catalog),
            board,
            registry: Arc::new(VehicleRegistry::new()),
            report: CycleReport::default(),
        }
    }
}

/// The single writer of snapshots. Not `Clone`, so only one refresh publishes.
pub struct SnapshotPublisher {
    sender: watch::Sender<Arc<Snapshot>>,
}

/// Read handle on the latest published snapshot.
#[derive(Clone)]
pub struct SnapshotReader {
    receiver: watch::Receiver<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new(initial: Snapshot) -> (Self, SnapshotReader) {
        let (sender, receiver) = watch::channel(Arc::new(initial));
        (Self { sender }, SnapshotReader { receiver })
    }

    /// Replace the published snapshot. Readers holding the old one keep it
    /// until they drop it.
    pub fn publish(&self, snapshot: Snapshot) {
        self.sender.send_replace(Arc::new(snapshot));
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotReader {
        SnapshotReader {
            receiver: self.sender.subscribe(),
        }
    }
}

impl SnapshotReader {
    pub fn current(&self) -> Arc<Snapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait until a snapshot newer than the last one seen by this reader is published.
    ///
    /// Returns `false` once the publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}
