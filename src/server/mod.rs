//! Overview HTTP listener
//!
//! Read-only routes over the published snapshots:
//!
//! - `GET /` HTML overview of every cluster
//! - `GET /api/clusters` all snapshots as JSON
//! - `GET /api/clusters/<index>` one snapshot as JSON
//! - `GET /health` liveness

pub mod render;

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::{MonitorError, MonitorResult};
use crate::monitor::{Snapshot, SnapshotReader};

/// Snapshot readers shared by the request handlers
#[derive(Debug, Clone)]
pub struct ServerState {
    readers: Arc<Vec<SnapshotReader>>,
    refresh_secs: u64,
}

impl ServerState {
    pub fn new(readers: Vec<SnapshotReader>, refresh_secs: u64) -> Self {
        ServerState {
            readers: Arc::new(readers),
            refresh_secs,
        }
    }

    /// Latest snapshot of every cluster
    pub fn snapshots(&self) -> Vec<Arc<Snapshot>> {
        self.readers.iter().map(|r| r.latest()).collect()
    }

    pub fn snapshot(&self, index: usize) -> Option<Arc<Snapshot>> {
        self.readers.get(index).map(|r| r.latest())
    }
}

fn with_state(state: ServerState) -> impl Filter<Extract = (ServerState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// All routes of the listener
pub fn routes(state: ServerState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: ServerState| warp::reply::html(render::overview_page(&state.snapshots(), state.refresh_secs)));

    let clusters = warp::path!("api" / "clusters")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: ServerState| {
            let snapshots: Vec<Snapshot> = state.snapshots().iter().map(|s| s.as_ref().clone()).collect();
            warp::reply::json(&snapshots)
        });

    let cluster = warp::path!("api" / "clusters" / usize)
        .and(warp::get())
        .and(with_state(state))
        .map(|index: usize, state: ServerState| match state.snapshot(index) {
            Some(snapshot) => warp::reply::with_status(warp::reply::json(snapshot.as_ref()), StatusCode::OK),
            None => warp::reply::with_status(
                warp::reply::json(&serde_json::json!({ "error": format!("no cluster at index {}", index) })),
                StatusCode::NOT_FOUND,
            ),
        });

    let health = warp::path!("health").and(warp::get()).map(|| "ok");

    index
        .or(clusters)
        .or(cluster)
        .or(health)
        .with(warp::log("esmon::server"))
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(state: ServerState, addr: SocketAddr, shutdown: F) -> MonitorResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| MonitorError::Server(format!("cannot listen on {}: {}", addr, e)))?;
    info!(addr = %bound, "overview listening");
    server.await;
    Ok(())
}
