//! Upstream reads
//!
//! The aggregator only sees the [`MetricsFetcher`] trait; [`HttpFetcher`]
//! implements it against a live cluster with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{FetchError, FetchResult};
use crate::types::{ClusterHealthDoc, ClusterStatsDoc, NodeStatsDoc};

/// The three idempotent reads made against a cluster every cycle
#[async_trait]
pub trait MetricsFetcher: Send + Sync {
    /// `GET /_cluster/stats`
    async fn cluster_stats(&self) -> FetchResult<ClusterStatsDoc>;

    /// `GET /_cluster/health`
    async fn cluster_health(&self) -> FetchResult<ClusterHealthDoc>;

    /// `GET /_nodes/stats`
    async fn node_stats(&self) -> FetchResult<NodeStatsDoc>;
}

/// Fetcher talking HTTP to one cluster host
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Build a fetcher for `host` (`name:port`, or a full base url)
    pub fn new(scheme: &str, host: &str, timeout: Duration) -> FetchResult<Self> {
        let base_url = base_url(scheme, host);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(HttpFetcher { client, base_url })
    }

    /// Share an already configured client
    pub fn with_client(client: reqwest::Client, scheme: &str, host: &str) -> Self {
        HttpFetcher {
            client,
            base_url: base_url(scheme, host),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FetchResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl MetricsFetcher for HttpFetcher {
    async fn cluster_stats(&self) -> FetchResult<ClusterStatsDoc> {
        self.get_json("/_cluster/stats").await
    }

    async fn cluster_health(&self) -> FetchResult<ClusterHealthDoc> {
        self.get_json("/_cluster/health").await
    }

    async fn node_stats(&self) -> FetchResult<NodeStatsDoc> {
        self.get_json("/_nodes/stats").await
    }
}

fn base_url(scheme: &str, host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("{}://{}", scheme, host)
    }
}
