use crate::cli::{Commands, DEFAULT_HOSTS_FILE};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::monitor::{ClusterAggregator, HttpFetcher, PollScheduler};
use crate::server::{self, ServerState};
use colored::*;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub fn execute_command(command: Commands, verbose: bool) -> MonitorResult<()> {
    match command {
        Commands::Serve { config, hosts, listen, interval_ms, timeout_ms } => {
            let config = resolve_config(config, hosts, listen, interval_ms, timeout_ms)?;
            execute_serve(config, verbose)
        }
        Commands::Check { hosts, scheme, timeout_ms, pretty } => {
            execute_check(hosts, scheme, timeout_ms, pretty, verbose)
        }
    }
}

/// Merge the config file (or `hosts.cfg`) with command line overrides
pub fn resolve_config(
    config: Option<PathBuf>,
    hosts: Vec<String>,
    listen: Option<SocketAddr>,
    interval_ms: Option<u64>,
    timeout_ms: Option<u64>,
) -> MonitorResult<MonitorConfig> {
    let mut resolved = match config {
        Some(path) => MonitorConfig::from_file(path)?,
        None if hosts.is_empty() => MonitorConfig::from_file(Path::new(DEFAULT_HOSTS_FILE))?,
        None => MonitorConfig::default(),
    };

    resolved.hosts.extend(hosts);
    if let Some(listen) = listen {
        resolved.listen = listen;
    }
    if let Some(interval_ms) = interval_ms {
        resolved.poll_interval_ms = interval_ms;
    }
    if let Some(timeout_ms) = timeout_ms {
        resolved.request_timeout_ms = timeout_ms;
    }

    resolved.validate()?;
    Ok(resolved)
}

fn build_aggregator(host: &str, scheme: &str, timeout: Duration, eviction: u64) -> MonitorResult<ClusterAggregator> {
    let fetcher = HttpFetcher::new(scheme, host, timeout)?;
    Ok(ClusterAggregator::new(host, Arc::new(fetcher)).with_node_eviction(eviction))
}

fn execute_serve(config: MonitorConfig, verbose: bool) -> MonitorResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut scheduler = PollScheduler::new(config.poll_interval());
        for host in &config.hosts {
            let aggregator = build_aggregator(host, &config.scheme, config.request_timeout(), config.node_eviction_cycles)?;
            scheduler.add(aggregator);
        }

        if verbose {
            println!("{} {} cluster(s)", "Polling:".bright_green(), scheduler.len());
            for host in &config.hosts {
                println!("  {}", host);
            }
            println!("{} http://{}", "Overview:".bright_green(), config.listen);
        }

        let handle = scheduler.start();
        let refresh_secs = (config.poll_interval_ms / 1000).max(1);
        let state = ServerState::new(handle.readers().to_vec(), refresh_secs);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received, shutting down");
        };
        let served = server::serve(state, config.listen, shutdown).await;

        handle.shutdown().await;
        served
    })
}

fn execute_check(hosts: Vec<String>, scheme: String, timeout_ms: u64, pretty: bool, verbose: bool) -> MonitorResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let timeout = Duration::from_millis(timeout_ms);

    runtime.block_on(async move {
        let mut snapshots = Vec::with_capacity(hosts.len());
        let mut unreachable = 0;

        for host in &hosts {
            let mut aggregator = build_aggregator(host, &scheme, timeout, 0)?;
            let report = aggregator.run_cycle().await;

            for (kind, error) in &report.failures {
                eprintln!("{} {} {}: {}", "Failed:".bright_red(), host, kind, error);
            }
            if !report.published {
                unreachable += 1;
            } else if verbose && report.is_clean() {
                eprintln!("{} {}", "OK:".bright_green(), host);
            }
            snapshots.push(aggregator.latest().as_ref().clone());
        }

        let output = if pretty {
            serde_json::to_string_pretty(&snapshots)
        } else {
            serde_json::to_string(&snapshots)
        }
        .map_err(|e| MonitorError::Other(format!("cannot encode snapshots: {}", e)))?;
        println!("{}", output);

        if unreachable > 0 {
            return Err(MonitorError::Other(format!("{} of {} cluster(s) unreachable", unreachable, hosts.len())));
        }
        Ok::<(), MonitorError>(())
    })
}
