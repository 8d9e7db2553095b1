//! Non-blocking hand-off of per-tick snapshots to an external monitor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::trace;

use crate::sim::types::TransferMatrix;

/// What a monitor needs to draw one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Ambient hour after the tick.
    pub hour: usize,
    /// Grid cost of the tick (EUR).
    pub grid_purchase: f64,
    /// Years looked back from the base year for the weather.
    pub year_offset: u32,
    /// Calendar year the weather was taken from.
    pub year: i32,
    /// Inhabitants per building, for weighting the display.
    pub inhabitants: Vec<u32>,
    /// Whether each building bought grid energy this tick.
    pub buying: Vec<bool>,
    /// Energy actually moved between buildings.
    pub transfers: TransferMatrix,
}

/// Sending half of the snapshot channel.
///
/// [`SnapshotPublisher::publish`] never blocks: a full channel drops the
/// snapshot and a disconnected consumer is ignored.
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    tx: Sender<Snapshot>,
    dropped: Arc<AtomicU64>,
}

/// Creates a bounded snapshot channel.
pub fn channel(capacity: usize) -> (SnapshotPublisher, Receiver<Snapshot>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (
        SnapshotPublisher {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

impl SnapshotPublisher {
    /// Offers a snapshot to the consumer.
    ///
    /// # Returns
    ///
    /// `true` if the snapshot was queued.
    pub fn publish(&self, snapshot: Snapshot) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => true,
            Err(TrySendError::Full(snapshot)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(hour = snapshot.hour, dropped, "snapshot channel full");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Number of snapshots dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
