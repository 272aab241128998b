//! Per-cluster poll, compute and publish cycle

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::{ClusterHealthDoc, ClusterStatsDoc, HealthColor, MetricSample};
use super::classify::health_severity;
use super::history::HistoryStore;
use super::publisher::{SnapshotPublisher, SnapshotReader};
use super::{bytes_to_terabytes, disk_used_percent, ClusterStatus, MetricsFetcher, NodeStatus, Snapshot};

/// Default number of node-stats rounds a node may be absent before its GC
/// history is dropped
pub const DEFAULT_NODE_EVICTION_CYCLES: u64 = 60;

/// Which of the three upstream reads failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Stats,
    Health,
    Nodes,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Stats => f.write_str("cluster stats"),
            FetchKind::Health => f.write_str("cluster health"),
            FetchKind::Nodes => f.write_str("node stats"),
        }
    }
}

/// Outcome of one [`ClusterAggregator::run_cycle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub failures: Vec<(FetchKind, FetchError)>,
    pub published: bool,
}

impl CycleReport {
    /// All three fetches succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, kind: FetchKind) -> bool {
        self.failures.iter().any(|(k, _)| *k == kind)
    }
}

/// Owns one cluster's history and working state and publishes its snapshots
pub struct ClusterAggregator {
    host: String,
    fetcher: Arc<dyn MetricsFetcher>,
    /// Per-node old GC time, two slots
    gc_history: HistoryStore,
    /// Cluster-wide moving shard count, sixty slots
    shard_history: HistoryStore,
    node_eviction_cycles: u64,
    stats: ClusterStatsDoc,
    health_color: HealthColor,
    shard_movement: Option<i64>,
    /// Nodes in fetch order
    nodes: Vec<NodeStatus>,
    cycle: u64,
    publisher: SnapshotPublisher,
}

impl ClusterAggregator {
    pub fn new(host: impl Into<String>, fetcher: Arc<dyn MetricsFetcher>) -> Self {
        let host = host.into();
        let publisher = SnapshotPublisher::new(Snapshot::pending(host.clone()));
        ClusterAggregator {
            host,
            fetcher,
            gc_history: HistoryStore::gc(),
            shard_history: HistoryStore::shards(),
            node_eviction_cycles: DEFAULT_NODE_EVICTION_CYCLES,
            stats: ClusterStatsDoc::default(),
            health_color: HealthColor::Unknown,
            shard_movement: None,
            nodes: Vec::new(),
            cycle: 0,
            publisher,
        }
    }

    /// Drop GC history of nodes missing from `cycles` consecutive node-stats
    /// responses; `0` never drops
    pub fn with_node_eviction(mut self, cycles: u64) -> Self {
        self.node_eviction_cycles = cycles;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.publisher.latest()
    }

    pub fn gc_history(&self) -> &HistoryStore {
        &self.gc_history
    }

    pub fn shard_history(&self) -> &HistoryStore {
        &self.shard_history
    }

    /// Refresh doc count and store size
    pub async fn fetch_stats(&mut self) -> Result<(), FetchError> {
        match self.fetcher.cluster_stats().await {
            Ok(stats) => {
                self.stats = stats;
                Ok(())
            }
            Err(e) => {
                warn!(host = %self.host, error = %e, "cluster stats fetch failed");
                Err(e)
            }
        }
    }

    /// Refresh health colour and record the moving shard count
    pub async fn fetch_health(&mut self) -> Result<(), FetchError> {
        let health = match self.fetcher.cluster_health().await {
            Ok(health) => health,
            Err(e) => {
                warn!(host = %self.host, error = %e, "cluster health fetch failed");
                return Err(e);
            }
        };
        self.apply_health(&health);
        Ok(())
    }

    fn apply_health(&mut self, health: &ClusterHealthDoc) {
        self.health_color = HealthColor::parse(&health.status);
        self.shard_history
            .record(&MetricSample::cluster(self.host.clone(), health.moving_shards()));
        if let Some(movement) = self.shard_history.drain(&self.host) {
            self.shard_movement = Some(movement);
        }
    }

    /// Refresh per-node disk, heap and GC delta
    pub async fn fetch_node_stats(&mut self) -> Result<(), FetchError> {
        let doc = match self.fetcher.node_stats().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(host = %self.host, error = %e, "node stats fetch failed");
                return Err(e);
            }
        };

        let mut nodes = Vec::with_capacity(doc.nodes.len());
        for node in doc.nodes {
            let disk_used = disk_used_percent(node.fs_free_bytes, node.fs_total_bytes);
            let sample = MetricSample::node(node.name, node.heap_used_percent, node.gc_old_time_ms, disk_used);
            self.gc_history.record(&sample);
            let gc_delta = self.gc_history.delta(&sample.entity_id).unwrap_or(0);
            nodes.push(NodeStatus::new(sample.entity_id, disk_used, sample.heap_used_percent, gc_delta));
        }

        for (node, last_seen) in self.gc_history.sweep(self.node_eviction_cycles) {
            debug!(host = %self.host, node = %node, last_seen = %last_seen, "dropped GC history of departed node");
        }

        self.nodes = nodes;
        Ok(())
    }

    /// Assemble a snapshot from the current working state
    pub fn build_snapshot(&self, stale: bool) -> Snapshot {
        let mut nodes = self.nodes.clone();
        // stable: equal heap keeps fetch order
        nodes.sort_by(|a, b| b.heap_used_percent.cmp(&a.heap_used_percent));

        Snapshot {
            host: self.host.clone(),
            cluster: ClusterStatus {
                health_color: self.health_color,
                health_class: health_severity(self.health_color),
                disk_used_terabytes: bytes_to_terabytes(self.stats.total_store_size_bytes),
                doc_count: self.stats.total_doc_count,
                shard_movement_delta: self.shard_movement,
            },
            nodes,
            published_at: Some(Utc::now()),
            stale,
            cycle: self.cycle,
        }
    }

    /// One full poll: the three fetches in order, then publish.
    ///
    /// A failed fetch never stops the following ones. When every fetch fails
    /// nothing is published and readers keep the previous snapshot.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let mut failures = Vec::new();

        if let Err(e) = self.fetch_stats().await {
            failures.push((FetchKind::Stats, e));
        }
        if let Err(e) = self.fetch_health().await {
            failures.push((FetchKind::Health, e));
        }
        if let Err(e) = self.fetch_node_stats().await {
            failures.push((FetchKind::Nodes, e));
        }

        let published = failures.len() < 3;
        if published {
            let snapshot = self.build_snapshot(!failures.is_empty());
            debug!(
                host = %self.host,
                cycle = self.cycle,
                nodes = snapshot.nodes.len(),
                stale = snapshot.stale,
                "publishing snapshot"
            );
            self.publisher.publish(snapshot);
        } else {
            debug!(host = %self.host, cycle = self.cycle, "all fetches failed, keeping previous snapshot");
        }

        CycleReport {
            cycle: self.cycle,
            failures,
            published,
        }
    }
}

impl fmt::Debug for ClusterAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterAggregator")
            .field("host", &self.host)
            .field("cycle", &self.cycle)
            .field("nodes", &self.nodes.len())
            .field("shard_movement", &self.shard_movement)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchResult;
    use crate::monitor::Severity;
    use crate::types::{NodeStatsDoc, NodeStatsEntry};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Serves whatever the test put in the slots; `None` fails the fetch
    #[derive(Default)]
    struct StubFetcher {
        stats: Mutex<Option<ClusterStatsDoc>>,
        health: Mutex<Option<ClusterHealthDoc>>,
        nodes: Mutex<Option<NodeStatsDoc>>,
    }

    fn refused(path: &str) -> FetchError {
        FetchError::Transport {
            url: format!("http://stub{}", path),
            message: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl MetricsFetcher for StubFetcher {
        async fn cluster_stats(&self) -> FetchResult<ClusterStatsDoc> {
            self.stats.lock().clone().ok_or_else(|| refused("/_cluster/stats"))
        }

        async fn cluster_health(&self) -> FetchResult<ClusterHealthDoc> {
            self.health.lock().clone().ok_or_else(|| refused("/_cluster/health"))
        }

        async fn node_stats(&self) -> FetchResult<NodeStatsDoc> {
            self.nodes.lock().clone().ok_or_else(|| refused("/_nodes/stats"))
        }
    }

    fn node(name: &str, heap: i64, gc: i64) -> NodeStatsEntry {
        NodeStatsEntry {
            name: name.to_string(),
            heap_used_percent: heap,
            gc_old_time_ms: gc,
            fs_free_bytes: 30,
            fs_total_bytes: 100,
        }
    }

    fn health(status: &str, moving: i64) -> ClusterHealthDoc {
        ClusterHealthDoc {
            status: status.to_string(),
            initializing_shards: 0,
            relocating_shards: 0,
            unassigned_shards: moving,
        }
    }

    fn healthy_stub() -> Arc<StubFetcher> {
        let stub = StubFetcher::default();
        *stub.stats.lock() = Some(ClusterStatsDoc {
            total_doc_count: 42,
            total_store_size_bytes: 3_000_000_000_000,
        });
        *stub.health.lock() = Some(health("green", 0));
        *stub.nodes.lock() = Some(NodeStatsDoc {
            nodes: vec![node("a", 10, 100), node("b", 90, 100), node("c", 50, 100)],
        });
        Arc::new(stub)
    }

    #[tokio::test]
    async fn test_cycle_publishes_ordered_snapshot() {
        let stub = healthy_stub();
        let mut aggregator = ClusterAggregator::new("es:9200", stub.clone());
        assert!(aggregator.latest().is_pending());

        let report = aggregator.run_cycle().await;
        assert!(report.is_clean());
        assert!(report.published);

        let snapshot = aggregator.latest();
        let heaps: Vec<i64> = snapshot.nodes.iter().map(|n| n.heap_used_percent).collect();
        assert_eq!(heaps, vec![90, 50, 10]);
        assert_eq!(snapshot.cluster.health_color, HealthColor::Green);
        assert_eq!(snapshot.cluster.health_class, Severity::Success);
        assert_eq!(snapshot.cluster.doc_count, 42);
        assert_eq!(snapshot.cluster.disk_used_terabytes, 3.0);
        assert_eq!(snapshot.cluster.shard_movement_delta, None);
        assert_eq!(snapshot.nodes[0].disk_used_percent, 70.0);
        assert_eq!(snapshot.nodes[0].heap_class, Severity::Danger);
        assert!(!snapshot.stale);
        assert_eq!(snapshot.cycle, 1);
    }

    #[tokio::test]
    async fn test_equal_heap_keeps_fetch_order() {
        let stub = healthy_stub();
        *stub.nodes.lock() = Some(NodeStatsDoc {
            nodes: vec![node("first", 40, 0), node("top", 60, 0), node("second", 40, 0), node("third", 40, 0)],
        });
        let mut aggregator = ClusterAggregator::new("es:9200", stub);
        aggregator.run_cycle().await;

        let names: Vec<String> = aggregator.latest().nodes.iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["top", "first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_gc_delta_between_cycles() {
        let stub = healthy_stub();
        let mut aggregator = ClusterAggregator::new("es:9200", stub.clone());
        aggregator.run_cycle().await;
        assert!(aggregator.latest().nodes.iter().all(|n| n.gc_delta_ms == 0));

        *stub.nodes.lock() = Some(NodeStatsDoc {
            nodes: vec![node("a", 10, 119), node("b", 90, 600), node("c", 50, 101)],
        });
        aggregator.run_cycle().await;

        let snapshot = aggregator.latest();
        let by_name = |name: &str| snapshot.nodes.iter().find(|n| n.name == name).cloned().unwrap();
        assert_eq!(by_name("a").gc_delta_ms, 19);
        assert_eq!(by_name("a").gc_class, Severity::Success);
        assert_eq!(by_name("b").gc_delta_ms, 500);
        assert_eq!(by_name("b").gc_class, Severity::Warning);
        assert_eq!(by_name("c").gc_delta_ms, 1);
    }

    #[tokio::test]
    async fn test_failed_node_fetch_keeps_previous_nodes() {
        let stub = healthy_stub();
        let mut aggregator = ClusterAggregator::new("es:9200", stub.clone());
        aggregator.run_cycle().await;
        let before = aggregator.latest();

        *stub.nodes.lock() = None;
        *stub.health.lock() = Some(health("yellow", 2));
        let report = aggregator.run_cycle().await;
        assert!(report.failed(FetchKind::Nodes));
        assert!(!report.failed(FetchKind::Health));
        assert!(report.published);

        let after = aggregator.latest();
        assert_eq!(after.nodes, before.nodes);
        assert_eq!(after.cluster.health_color, HealthColor::Yellow);
        assert!(after.stale);
    }

    #[tokio::test]
    async fn test_all_fetches_failing_keeps_snapshot() {
        let stub = healthy_stub();
        let mut aggregator = ClusterAggregator::new("es:9200", stub.clone());
        aggregator.run_cycle().await;
        let before = aggregator.latest();

        *stub.stats.lock() = None;
        *stub.health.lock() = None;
        *stub.nodes.lock() = None;
        let report = aggregator.run_cycle().await;
        assert_eq!(report.failures.len(), 3);
        assert!(!report.published);
        assert!(Arc::ptr_eq(&before, &aggregator.latest()));
    }

    #[tokio::test]
    async fn test_health_recorded_when_other_fetches_fail() {
        let stub = healthy_stub();
        *stub.stats.lock() = None;
        *stub.nodes.lock() = None;
        let mut aggregator = ClusterAggregator::new("es:9200", stub.clone());

        for i in 0..60 {
            *stub.health.lock() = Some(health("yellow", 60 - i));
            aggregator.run_cycle().await;
        }
        // 60 down to 1
        assert_eq!(aggregator.latest().cluster.shard_movement_delta, Some(59));
        assert_eq!(aggregator.shard_history().window("es:9200").unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_departed_node_history_is_evicted() {
        let stub = healthy_stub();
        let mut aggregator = ClusterAggregator::new("es:9200", stub.clone()).with_node_eviction(2);
        aggregator.run_cycle().await;
        assert_eq!(aggregator.gc_history().len(), 3);

        *stub.nodes.lock() = Some(NodeStatsDoc {
            nodes: vec![node("a", 10, 100)],
        });
        for _ in 0..3 {
            aggregator.run_cycle().await;
        }
        assert_eq!(aggregator.gc_history().len(), 1);
        assert!(aggregator.gc_history().window("a").is_some());
    }
}
