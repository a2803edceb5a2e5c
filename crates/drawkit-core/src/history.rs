//! Bounded undo history of main-surface snapshots.

use crate::input::Instant;
use crate::surface::RasterImage;
use kurbo::Point;
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of snapshots kept.
pub const DEFAULT_CAPACITY: usize = 20;
/// Default minimum interval between two undos.
pub const DEFAULT_UNDO_DEBOUNCE: Duration = Duration::from_millis(300);

/// Capture of the main surface after a commit.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub raster: RasterImage,
    /// Last point placed by the drawable that produced this state.
    pub anchor: Option<Point>,
}

impl HistorySnapshot {
    /// Snapshot of committed pixels and the last placed point.
    pub fn new(raster: RasterImage, anchor: Option<Point>) -> Self {
        Self { raster, anchor }
    }
}

/// What the main surface should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Restore<'a> {
    Snapshot(&'a HistorySnapshot),
    /// Nothing recorded: clear the surface.
    Blank,
}

impl<'a> Restore<'a> {
    /// Anchor of the restored state; `None` for a blank canvas.
    pub fn anchor(&self) -> Option<Point> {
        match self {
            Restore::Snapshot(s) => s.anchor,
            Restore::Blank => None,
        }
    }
}

/// FIFO of snapshots; the oldest is evicted when full.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistorySnapshot>,
    capacity: usize,
    debounce: Duration,
    last_undo: Option<Instant>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    /// History keeping at most `capacity` snapshots, with the default undo debounce.
    pub fn new(capacity: usize) -> Self {
        Self::with_debounce(capacity, DEFAULT_UNDO_DEBOUNCE)
    }

    /// History with a custom undo debounce.
    pub fn with_debounce(capacity: usize, debounce: Duration) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity), capacity, debounce, last_undo: None }
    }

    /// Record a new state, evicting the oldest one over capacity.
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        log::debug!("History push ({} of {})", self.entries.len(), self.capacity);
    }

    /// Drop the most recent state, unless empty or called again within the
    /// debounce interval. Returns whether an entry was removed.
    pub fn undo_at(&mut self, now: Instant) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let too_soon = self
            .last_undo
            .is_some_and(|last| now.saturating_duration_since(last) < self.debounce);
        if too_soon {
            log::debug!("Undo ignored (debounced)");
            return false;
        }
        self.last_undo = Some(now);
        self.entries.pop_back();
        true
    }

    /// [`History::undo_at`] using the current time.
    pub fn undo(&mut self) -> bool {
        self.undo_at(Instant::now())
    }

    /// State the main surface should show.
    pub fn current(&self) -> Restore<'_> {
        match self.entries.back() {
            Some(snapshot) => Restore::Snapshot(snapshot),
            None => Restore::Blank,
        }
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_undo = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of snapshots kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistorySnapshot> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tag: u8) -> HistorySnapshot {
        let mut raster = RasterImage::new(1, 1);
        raster.set_pixel(0, 0, [tag, 0, 0, 255]);
        HistorySnapshot::new(raster, Some(Point::new(tag as f64, 0.0)))
    }

    fn tag(restore: Restore<'_>) -> Option<u8> {
        match restore {
            Restore::Snapshot(s) => s.raster.pixel(0, 0).map(|p| p[0]),
            Restore::Blank => None,
        }
    }

    #[test]
    fn test_eviction_and_undo() {
        let mut history = History::new(3);
        for i in 1..=4 {
            history.push(snap(i));
        }
        let tags: Vec<u8> = history.iter().filter_map(|s| s.raster.pixel(0, 0)).map(|p| p[0]).collect();
        assert_eq!(tags, vec![2, 3, 4]);
        assert_eq!(tag(history.current()), Some(4));
        assert!(history.undo_at(Instant::now()));
        assert_eq!(tag(history.current()), Some(3));
        assert_eq!(history.current().anchor(), Some(Point::new(3.0, 0.0)));
    }

    #[test]
    fn test_undo_debounce() {
        let mut history = History::new(5);
        for i in 1..=3 {
            history.push(snap(i));
        }
        let t0 = Instant::now();
        assert!(history.undo_at(t0));
        assert!(!history.undo_at(t0 + Duration::from_millis(100)));
        assert_eq!(history.len(), 2);
        assert!(history.undo_at(t0 + Duration::from_millis(301)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_empty_is_blank() {
        let mut history = History::default();
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
        assert!(!history.undo());
        assert_eq!(history.current(), Restore::Blank);
        history.push(snap(1));
        history.clear();
        assert!(history.is_empty());
    }
}
