//! Cluster monitoring
//!
//! Polls each configured cluster, keeps bounded GC and shard history, and
//! publishes an immutable [`Snapshot`] per cluster for the render layer.

pub mod history;
pub mod classify;
pub mod fetch;
pub mod publisher;
pub mod aggregator;
pub mod scheduler;

pub use history::{HistoryStore, SlidingWindow, TrackedMetric, GC_WINDOW, SHARD_WINDOW};
pub use classify::{classify_gc, classify_health, classify_heap, Severity};
pub use fetch::{HttpFetcher, MetricsFetcher};
pub use publisher::{SnapshotPublisher, SnapshotReader};
pub use aggregator::{ClusterAggregator, CycleReport, FetchKind};
pub use scheduler::{PollHandle, PollScheduler};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::HealthColor;

/// Derived status of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Node name
    pub name: String,
    /// Filesystem usage percentage, two decimals
    pub disk_used_percent: f64,
    /// JVM heap usage percentage
    pub heap_used_percent: i64,
    /// Old GC time spent since the previous poll (milliseconds)
    pub gc_delta_ms: i64,
    /// Heap classification
    pub heap_class: Severity,
    /// GC classification
    pub gc_class: Severity,
}

impl NodeStatus {
    pub fn new(name: impl Into<String>, disk_used_percent: f64, heap_used_percent: i64, gc_delta_ms: i64) -> Self {
        NodeStatus {
            name: name.into(),
            disk_used_percent,
            heap_used_percent,
            gc_delta_ms,
            heap_class: classify_heap(heap_used_percent),
            gc_class: classify_gc(gc_delta_ms),
        }
    }
}

/// Derived status of a whole cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatus {
    /// Health colour reported by the cluster
    pub health_color: HealthColor,
    /// Health classification
    pub health_class: Severity,
    /// Total store size in terabytes, two decimals
    pub disk_used_terabytes: f64,
    /// Total document count
    pub doc_count: u64,
    /// Moving shards a minute ago minus moving shards now; `None` until a
    /// full window has been recorded
    pub shard_movement_delta: Option<i64>,
}

impl Default for ClusterStatus {
    fn default() -> Self {
        ClusterStatus {
            health_color: HealthColor::Unknown,
            health_class: Severity::Unknown,
            disk_used_terabytes: 0.0,
            doc_count: 0,
            shard_movement_delta: None,
        }
    }
}

/// Immutable view of a cluster, replaced wholesale on every publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Cluster host as configured
    pub host: String,
    /// Cluster-wide status
    pub cluster: ClusterStatus,
    /// Nodes ordered by heap usage, highest first
    pub nodes: Vec<NodeStatus>,
    /// When this snapshot was built; `None` before the first successful cycle
    pub published_at: Option<DateTime<Utc>>,
    /// Some fetch of the publishing cycle failed, so parts are carried over
    pub stale: bool,
    /// Poll cycle that produced the snapshot
    pub cycle: u64,
}

impl Snapshot {
    /// Placeholder shown until the first cycle publishes
    pub fn pending(host: impl Into<String>) -> Self {
        Snapshot {
            host: host.into(),
            cluster: ClusterStatus::default(),
            nodes: Vec::new(),
            published_at: None,
            stale: true,
            cycle: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.published_at.is_none()
    }
}

/// Round half-up to `places` decimals
pub fn round_half_up(value: f64, places: u32) -> f64 {
    let pow = 10f64.powi(places as i32);
    let digit = value * pow;
    let rounded = if digit - digit.floor() >= 0.5 {
        digit.ceil()
    } else {
        digit.floor()
    };
    rounded / pow
}

/// Used share of a filesystem in percent; an empty or unknown filesystem
/// (`total == 0`) counts as 0% used
pub fn disk_used_percent(free_bytes: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return 0.0;
    }
    let free_ratio = free_bytes as f64 / total_bytes as f64;
    round_half_up((1.0 - free_ratio) * 100.0, 2)
}

/// Bytes to decimal terabytes, two decimals
pub fn bytes_to_terabytes(bytes: u64) -> f64 {
    round_half_up(bytes as f64 * 1e-12, 2)
}
