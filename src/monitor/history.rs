//! Bounded sample history
//!
//! Keeps a small FIFO window of one scalar per entity so that short-horizon
//! deltas (GC time between two polls, shard movement over a minute) can be
//! derived without persisting anything.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::types::MetricSample;

/// Capacity of the per-node GC window
pub const GC_WINDOW: usize = 2;

/// Capacity of the cluster-wide shard movement window
pub const SHARD_WINDOW: usize = 60;

/// Scalar of a [`MetricSample`] tracked by a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedMetric {
    /// Old-generation GC time
    GcTime,
    /// Initializing + relocating + unassigned shards
    ShardCount,
}

impl TrackedMetric {
    fn extract(&self, sample: &MetricSample) -> i64 {
        match self {
            TrackedMetric::GcTime => sample.gc_time_ms,
            TrackedMetric::ShardCount => sample.shard_count,
        }
    }
}

/// Fixed-capacity FIFO of scalars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlidingWindow {
    values: VecDeque<i64>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        SlidingWindow {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a value, evicting the oldest ones past capacity
    pub fn push(&mut self, value: i64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest and newest value, only once the window is full
    pub fn span(&self) -> Option<(i64, i64)> {
        if !self.is_full() {
            return None;
        }
        Some((*self.values.front()?, *self.values.back()?))
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().copied()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    window: SlidingWindow,
    last_sweep: u64,
    last_seen: DateTime<Utc>,
}

/// Per-entity bounded windows for one tracked metric
///
/// Windows are independent: recording for one entity never touches another
/// entity's history.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    metric: TrackedMetric,
    capacity: usize,
    entries: HashMap<String, Entry>,
    sweeps: u64,
}

impl HistoryStore {
    /// Create a store tracking `metric` with windows of `capacity` values
    pub fn new(metric: TrackedMetric, capacity: usize) -> Self {
        HistoryStore {
            metric,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            sweeps: 0,
        }
    }

    /// Two-slot GC time store
    pub fn gc() -> Self {
        Self::new(TrackedMetric::GcTime, GC_WINDOW)
    }

    /// Sixty-slot shard movement store
    pub fn shards() -> Self {
        Self::new(TrackedMetric::ShardCount, SHARD_WINDOW)
    }

    /// Append the tracked scalar of `sample` to its entity's window
    pub fn record(&mut self, sample: &MetricSample) {
        let value = self.metric.extract(sample);
        let sweeps = self.sweeps;
        let capacity = self.capacity;
        let entry = self
            .entries
            .entry(sample.entity_id.clone())
            .or_insert_with(|| Entry {
                window: SlidingWindow::new(capacity),
                last_sweep: sweeps,
                last_seen: sample.timestamp,
            });
        entry.window.push(value);
        entry.last_sweep = sweeps;
        entry.last_seen = entry.last_seen.max(sample.timestamp);
    }

    /// Newest minus oldest value, once the entity's window is full
    pub fn delta(&self, entity_id: &str) -> Option<i64> {
        self.window(entity_id)?.span().map(|(first, last)| last.saturating_sub(first))
    }

    /// Oldest minus newest value, once the entity's window is full
    ///
    /// Positive when the tracked count went down over the window.
    pub fn drain(&self, entity_id: &str) -> Option<i64> {
        self.window(entity_id)?.span().map(|(first, last)| first.saturating_sub(last))
    }

    /// Timestamp of the newest sample recorded for the entity
    pub fn last_seen(&self, entity_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(entity_id).map(|e| e.last_seen)
    }

    pub fn window(&self, entity_id: &str) -> Option<&SlidingWindow> {
        self.entries.get(entity_id).map(|e| &e.window)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close a recording round and drop entities idle for more than
    /// `max_idle` rounds. `max_idle == 0` keeps everything.
    ///
    /// Returns the evicted entity ids with the time each was last seen.
    pub fn sweep(&mut self, max_idle: u64) -> Vec<(String, DateTime<Utc>)> {
        self.sweeps += 1;
        if max_idle == 0 {
            return Vec::new();
        }
        let now = self.sweeps;
        let mut evicted = Vec::new();
        self.entries.retain(|id, entry| {
            let keep = now - entry.last_sweep <= max_idle;
            if !keep {
                evicted.push((id.clone(), entry.last_seen));
            }
            keep
        });
        evicted.sort();
        evicted
    }
}
