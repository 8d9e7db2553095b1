//! Monitor application state fed by the snapshot channel.

use std::collections::VecDeque;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::sim::snapshot::Snapshot;

/// Maximum number of snapshots kept for the rolling chart.
pub const MAX_HISTORY: usize = 200;

/// Redraw interval options in milliseconds (slowest → fastest).
pub const SPEED_LEVELS_MS: [u64; 6] = [500, 250, 100, 50, 20, 5];

/// Default speed index (100 ms).
const DEFAULT_SPEED_IDX: usize = 2;

/// Monitor state.
pub struct App {
    rx: Receiver<Snapshot>,
    /// Rolling window of received snapshots, oldest first.
    pub history: VecDeque<Snapshot>,
    /// Snapshots received since start, including those rolled out of `history`.
    pub received: usize,
    /// Grid cost summed over every received snapshot (EUR).
    pub total_cost: f64,
    /// Whether draining is suspended; the simulation keeps running.
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// Set once the simulation hung up and the channel is empty.
    pub finished: bool,
}

impl App {
    pub fn new(rx: Receiver<Snapshot>) -> Self {
        Self {
            rx,
            history: VecDeque::with_capacity(MAX_HISTORY),
            received: 0,
            total_cost: 0.0,
            paused: false,
            speed_idx: DEFAULT_SPEED_IDX,
            quit: false,
            finished: false,
        }
    }

    /// Pulls every pending snapshot without blocking.
    ///
    /// Does nothing while paused.
    pub fn drain(&mut self) {
        if self.paused {
            return;
        }
        loop {
            match self.rx.try_recv() {
                Ok(snapshot) => self.push(snapshot),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }
    }

    fn push(&mut self, snapshot: Snapshot) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.received += 1;
        self.total_cost += snapshot.grid_purchase;
        self.history.push_back(snapshot);
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Redraws more often.
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Redraws less often.
    pub fn speed_down(&mut self) {
        self.speed_idx = self.speed_idx.saturating_sub(1);
    }

    /// Returns the current redraw interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Returns the most recent snapshot, if any.
    pub fn last(&self) -> Option<&Snapshot> {
        self.history.back()
    }

    /// `(hour, grid cost)` points for the chart.
    pub fn cost_points(&self) -> Vec<(f64, f64)> {
        self.history
            .iter()
            .map(|s| (s.hour as f64, s.grid_purchase))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::TransferMatrix;

    fn snapshot(hour: usize, cost: f64) -> Snapshot {
        Snapshot {
            hour,
            grid_purchase: cost,
            year_offset: 3,
            year: 2019,
            inhabitants: vec![2, 4],
            buying: vec![cost > 0.0, false],
            transfers: TransferMatrix::zeros(2),
        }
    }

    #[test]
    fn drains_pending_snapshots() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut app = App::new(rx);
        tx.send(snapshot(1, 0.5)).unwrap();
        tx.send(snapshot(2, 0.25)).unwrap();
        app.drain();
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.last().map(|s| s.hour), Some(2));
        assert!((app.total_cost - 0.75).abs() < 1e-12);
        assert!(!app.finished);
    }

    #[test]
    fn pause_suspends_draining() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut app = App::new(rx);
        app.toggle_pause();
        tx.send(snapshot(1, 0.0)).unwrap();
        app.drain();
        assert!(app.history.is_empty());
        app.toggle_pause();
        app.drain();
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn finishes_when_sender_hangs_up() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut app = App::new(rx);
        tx.send(snapshot(1, 0.0)).unwrap();
        drop(tx);
        app.drain();
        assert_eq!(app.received, 1);
        assert!(app.finished);
    }

    #[test]
    fn history_caps_at_max() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut app = App::new(rx);
        for hour in 0..MAX_HISTORY + 25 {
            tx.send(snapshot(hour, 0.1)).unwrap();
        }
        app.drain();
        assert_eq!(app.history.len(), MAX_HISTORY);
        assert_eq!(app.received, MAX_HISTORY + 25);
        assert_eq!(app.history.front().map(|s| s.hour), Some(25));
    }

    #[test]
    fn speed_controls_stay_in_bounds() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut app = App::new(rx);
        for _ in 0..10 {
            app.speed_down();
        }
        assert_eq!(app.speed_idx, 0);
        for _ in 0..10 {
            app.speed_up();
        }
        assert_eq!(app.speed_idx, SPEED_LEVELS_MS.len() - 1);
    }
}
