//! Core types and data structures for esmon
//!
//! Holds the measurement sample recorded into history windows and the three
//! upstream documents read on every poll cycle. The documents deserialize
//! straight from the cluster's JSON responses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single node or cluster measurement at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Node name, or cluster host for cluster-wide samples
    pub entity_id: String,
    /// When the measurement was taken
    pub timestamp: DateTime<Utc>,
    /// JVM heap usage percentage
    pub heap_used_percent: i64,
    /// Cumulative old-generation GC time (milliseconds)
    pub gc_time_ms: i64,
    /// Filesystem usage percentage
    pub disk_used_percent: f64,
    /// Shards currently initializing, relocating or unassigned
    pub shard_count: i64,
}

impl MetricSample {
    /// Sample for one node of a cluster
    pub fn node(entity_id: impl Into<String>, heap_used_percent: i64, gc_time_ms: i64, disk_used_percent: f64) -> Self {
        MetricSample {
            entity_id: entity_id.into(),
            timestamp: Utc::now(),
            heap_used_percent,
            gc_time_ms,
            disk_used_percent,
            shard_count: 0,
        }
    }

    /// Cluster-wide sample carrying the moving shard count
    pub fn cluster(entity_id: impl Into<String>, shard_count: i64) -> Self {
        MetricSample {
            entity_id: entity_id.into(),
            timestamp: Utc::now(),
            heap_used_percent: 0,
            gc_time_ms: 0,
            disk_used_percent: 0.0,
            shard_count,
        }
    }
}

/// Cluster health colour as reported by `_cluster/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthColor {
    Green,
    Yellow,
    Red,
    Unknown,
}

impl HealthColor {
    /// Parse the upstream status string; anything unrecognised is `Unknown`
    pub fn parse(status: &str) -> Self {
        match status {
            "green" => HealthColor::Green,
            "yellow" => HealthColor::Yellow,
            "red" => HealthColor::Red,
            _ => HealthColor::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthColor::Green => "green",
            HealthColor::Yellow => "yellow",
            HealthColor::Red => "red",
            HealthColor::Unknown => "unknown",
        }
    }
}

impl Default for HealthColor {
    fn default() -> Self {
        HealthColor::Unknown
    }
}

impl fmt::Display for HealthColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `GET /_cluster/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "wire::ClusterStats")]
pub struct ClusterStatsDoc {
    pub total_doc_count: u64,
    pub total_store_size_bytes: u64,
}

/// Parsed `GET /_cluster/health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealthDoc {
    pub status: String,
    #[serde(default)]
    pub initializing_shards: i64,
    #[serde(default)]
    pub relocating_shards: i64,
    #[serde(default)]
    pub unassigned_shards: i64,
}

impl ClusterHealthDoc {
    /// Shards that are not settled on their final node
    pub fn moving_shards(&self) -> i64 {
        self.initializing_shards
            .saturating_add(self.relocating_shards)
            .saturating_add(self.unassigned_shards)
    }
}

/// Parsed `GET /_nodes/stats`, nodes in the order the cluster listed them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "wire::NodesStats")]
pub struct NodeStatsDoc {
    pub nodes: Vec<NodeStatsEntry>,
}

/// Per-node subset of `_nodes/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatsEntry {
    pub name: String,
    pub heap_used_percent: i64,
    /// Old-generation collector time (milliseconds)
    pub gc_old_time_ms: i64,
    pub fs_free_bytes: u64,
    pub fs_total_bytes: u64,
}

/// Wire shapes of the upstream JSON documents
mod wire {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::{ClusterStatsDoc, NodeStatsDoc, NodeStatsEntry};

    #[derive(Deserialize)]
    pub struct ClusterStats {
        #[serde(default)]
        indices: Indices,
    }

    #[derive(Deserialize, Default)]
    struct Indices {
        #[serde(default)]
        docs: Docs,
        #[serde(default)]
        store: Store,
    }

    #[derive(Deserialize, Default)]
    struct Docs {
        #[serde(default)]
        count: u64,
    }

    #[derive(Deserialize, Default)]
    struct Store {
        #[serde(default)]
        size_in_bytes: u64,
    }

    impl From<ClusterStats> for ClusterStatsDoc {
        fn from(raw: ClusterStats) -> Self {
            ClusterStatsDoc {
                total_doc_count: raw.indices.docs.count,
                total_store_size_bytes: raw.indices.store.size_in_bytes,
            }
        }
    }

    /// `nodes` is an object keyed by node id; `preserve_order` keeps the
    /// upstream listing order in the map.
    #[derive(Deserialize)]
    pub struct NodesStats {
        #[serde(default)]
        nodes: serde_json::Map<String, serde_json::Value>,
    }

    #[derive(Deserialize)]
    struct Node {
        name: String,
        #[serde(default)]
        jvm: Jvm,
        #[serde(default)]
        fs: Fs,
    }

    #[derive(Deserialize, Default)]
    struct Jvm {
        #[serde(default)]
        mem: Mem,
        #[serde(default)]
        gc: Gc,
    }

    #[derive(Deserialize, Default)]
    struct Mem {
        #[serde(default)]
        heap_used_percent: i64,
    }

    #[derive(Deserialize, Default)]
    struct Gc {
        #[serde(default)]
        collectors: HashMap<String, Collector>,
    }

    #[derive(Deserialize, Default)]
    struct Collector {
        #[serde(default)]
        collection_time_in_millis: i64,
    }

    #[derive(Deserialize, Default)]
    struct Fs {
        #[serde(default)]
        data: Vec<FsData>,
    }

    #[derive(Deserialize, Default)]
    struct FsData {
        #[serde(default)]
        free_in_bytes: u64,
        #[serde(default)]
        total_in_bytes: u64,
    }

    impl TryFrom<NodesStats> for NodeStatsDoc {
        type Error = String;

        fn try_from(raw: NodesStats) -> Result<Self, Self::Error> {
            let mut nodes = Vec::with_capacity(raw.nodes.len());
            for (id, value) in raw.nodes {
                let node: Node = serde_json::from_value(value).map_err(|e| format!("node {}: {}", id, e))?;
                let (fs_free_bytes, fs_total_bytes) = node
                    .fs
                    .data
                    .first()
                    .map(|d| (d.free_in_bytes, d.total_in_bytes))
                    .unwrap_or((0, 0));
                nodes.push(NodeStatsEntry {
                    name: node.name,
                    heap_used_percent: node.jvm.mem.heap_used_percent,
                    gc_old_time_ms: node
                        .jvm
                        .gc
                        .collectors
                        .get("old")
                        .map(|c| c.collection_time_in_millis)
                        .unwrap_or(0),
                    fs_free_bytes,
                    fs_total_bytes,
                });
            }
            Ok(NodeStatsDoc { nodes })
        }
    }
}
