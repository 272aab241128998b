//! Monitor configuration
//!
//! Configuration comes either from a TOML file or from a plain host list
//! with one `host:port` per line.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::monitor::aggregator::DEFAULT_NODE_EVICTION_CYCLES;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Cluster hosts, `host:port` or full base urls
    pub hosts: Vec<String>,
    /// Scheme used for hosts given without one
    pub scheme: String,
    /// Poll period per cluster (milliseconds)
    pub poll_interval_ms: u64,
    /// Timeout of each upstream request (milliseconds)
    pub request_timeout_ms: u64,
    /// Node-stats rounds a node may be missing before its GC history is
    /// dropped; 0 keeps it forever
    pub node_eviction_cycles: u64,
    /// Address of the overview HTTP listener
    pub listen: SocketAddr,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            hosts: Vec::new(),
            scheme: "http".to_string(),
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
            node_eviction_cycles: DEFAULT_NODE_EVICTION_CYCLES,
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl MonitorConfig {
    /// Load a config file: `.toml` files are parsed as TOML, anything else
    /// as a host list
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let is_toml = path.extension().map_or(false, |ext| ext == "toml");
        let content = read(path)?;
        if is_toml {
            Self::from_toml_str(&content).map_err(|e| match e {
                ConfigError::Parse { message, .. } => ConfigError::Parse {
                    path: path.display().to_string(),
                    message,
                },
                other => other,
            })
        } else {
            Ok(MonitorConfig {
                hosts: parse_host_list(&content),
                ..MonitorConfig::default()
            })
        }
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Check the values a poll loop cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(ConfigError::NoHosts);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.scheme != "http" && self.scheme != "https" {
            return Err(ConfigError::InvalidValue {
                field: "scheme",
                message: format!("expected http or https, got {}", self.scheme),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// One host per line; blank lines and `#` comments are skipped
pub fn parse_host_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn read(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}
