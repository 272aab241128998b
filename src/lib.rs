//! # esmon: search cluster overview
//!
//! Polls one or more search clusters on a fixed interval, keeps a short
//! bounded history of GC time and shard movement, classifies node and
//! cluster health, and publishes one immutable snapshot per cluster.
//!
//! The core lives in [`monitor`]; [`server`] renders the snapshots and
//! [`commands`] wires everything together for the binary.

#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod config;
pub mod monitor;
pub mod server;
/// Command-line interface and argument parsing
pub mod cli;
/// Command execution and orchestration
pub mod commands;

// Re-export main types
pub use types::{ClusterHealthDoc, ClusterStatsDoc, HealthColor, MetricSample, NodeStatsDoc, NodeStatsEntry};
pub use error::{ConfigError, FetchError, FetchResult, MonitorError, MonitorResult};
pub use config::MonitorConfig;
pub use monitor::{
    ClusterAggregator, ClusterStatus, CycleReport, HistoryStore, HttpFetcher, MetricsFetcher, NodeStatus, PollHandle,
    PollScheduler, Severity, Snapshot, SnapshotPublisher, SnapshotReader,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
