//! Fixed-interval polling, one task per cluster

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::aggregator::ClusterAggregator;
use super::publisher::SnapshotReader;

/// Reference poll period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Collects aggregators and starts their poll loops
#[derive(Debug)]
pub struct PollScheduler {
    interval: Duration,
    aggregators: Vec<ClusterAggregator>,
}

/// Running poll loops
///
/// Dropping the handle without calling [`PollHandle::shutdown`] also stops
/// the loops, since the shutdown sender goes away.
#[derive(Debug)]
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
    readers: Vec<SnapshotReader>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        PollScheduler {
            interval,
            aggregators: Vec::new(),
        }
    }

    /// Register a cluster; returns the reader of its snapshots
    pub fn add(&mut self, aggregator: ClusterAggregator) -> SnapshotReader {
        let reader = aggregator.reader();
        self.aggregators.push(aggregator);
        reader
    }

    pub fn len(&self) -> usize {
        self.aggregators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregators.is_empty()
    }

    /// Spawn one independent loop per cluster
    pub fn start(self) -> PollHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(self.aggregators.len());
        let mut readers = Vec::with_capacity(self.aggregators.len());

        for aggregator in self.aggregators {
            readers.push(aggregator.reader());
            let host = aggregator.host().to_string();
            info!(host = %host, interval_ms = self.interval.as_millis() as u64, "starting poll loop");
            let task = tokio::spawn(poll_loop(aggregator, self.interval, shutdown_rx.clone()));
            tasks.push((host, task));
        }

        PollHandle {
            shutdown,
            tasks,
            readers,
        }
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollHandle {
    /// Snapshot readers in registration order
    pub fn readers(&self) -> &[SnapshotReader] {
        &self.readers
    }

    /// Signal every loop to stop and wait for them; a cycle in flight is
    /// abandoned
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (host, task) in self.tasks {
            match task.await {
                Ok(()) => debug!(host = %host, "poll loop stopped"),
                Err(e) => error!(host = %host, error = %e, "poll loop ended abnormally"),
            }
        }
        info!("all poll loops stopped");
    }
}

async fn poll_loop(mut aggregator: ClusterAggregator, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = async {
                ticker.tick().await;
                aggregator.run_cycle().await
            } => {}
        }
    }
}
