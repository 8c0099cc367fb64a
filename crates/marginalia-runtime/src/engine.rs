//! Background centrality worker
//!
//! The worker owns nothing but two channels. Each request carries its own
//! node and edge lists; the graph is rebuilt and scored on the blocking pool
//! and the response is sent back tagged with the request id. Callers keep
//! the id of their latest submission and drop any older response that
//! arrives afterwards.
//!
//! Requests are bounded; responses are not, so the worker never waits on a
//! caller that submits without receiving.

use anyhow::{Context, anyhow};
use marginalia_core::network::{Edge, Node};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::Result;
use crate::jobs::{CentralityJob, CentralityOutcome, CentralityResponse};

/// Queue depth for pending requests
const REQUEST_CAPACITY: usize = 16;

/// Spawns the worker task
pub struct CentralityWorker;

impl CentralityWorker {
    /// Start a worker on the current tokio runtime and return its client.
    ///
    /// Must be called from within a runtime.
    pub fn spawn() -> CentralityClient {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CAPACITY);
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(request_rx, response_tx));

        tracing::debug!("Centrality worker started");

        CentralityClient {
            requests: request_tx,
            responses: response_rx,
            latest: None,
            handle,
        }
    }
}

async fn run_worker(
    mut requests: mpsc::Receiver<CentralityJob>,
    responses: mpsc::UnboundedSender<CentralityResponse>,
) {
    while let Some(job) = requests.recv().await {
        let request_id = job.request_id;
        tracing::debug!(
            %request_id,
            nodes = job.nodes.len(),
            edges = job.edges.len(),
            "Computing centrality"
        );

        let response = match tokio::task::spawn_blocking(move || job.execute()).await {
            Ok(response) => response,
            Err(e) => CentralityResponse {
                request_id,
                outcome: CentralityOutcome::Failed {
                    error: format!("centrality task aborted: {e}"),
                },
            },
        };

        if let CentralityOutcome::Failed { error } = &response.outcome {
            tracing::warn!(%request_id, %error, "Centrality computation failed");
        }

        if responses.send(response).is_err() {
            tracing::debug!("Centrality client dropped, stopping worker");
            break;
        }
    }

    tracing::debug!("Centrality worker stopped");
}

/// Handle for talking to a running [`CentralityWorker`]
pub struct CentralityClient {
    requests: mpsc::Sender<CentralityJob>,
    responses: mpsc::UnboundedReceiver<CentralityResponse>,
    latest: Option<Uuid>,
    handle: JoinHandle<()>,
}

impl CentralityClient {
    /// Send a network to the worker. The new request becomes the latest one.
    pub async fn submit(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Uuid> {
        let job = CentralityJob::new(nodes, edges);
        let request_id = job.request_id;

        self.requests
            .send(job)
            .await
            .map_err(|_| anyhow!("centrality worker is not running"))?;

        self.latest = Some(request_id);
        Ok(request_id)
    }

    /// Id of the most recent submission
    pub fn latest(&self) -> Option<Uuid> {
        self.latest
    }

    /// Wait for the response to the latest request, discarding stale ones.
    pub async fn recv_latest(&mut self) -> Result<CentralityResponse> {
        let latest = self
            .latest
            .ok_or_else(|| anyhow!("no centrality request has been submitted"))?;

        loop {
            let response = self
                .responses
                .recv()
                .await
                .ok_or_else(|| anyhow!("centrality worker stopped before responding"))?;

            if response.request_id == latest {
                return Ok(response);
            }
            tracing::debug!(
                request_id = %response.request_id,
                "Discarding stale centrality response"
            );
        }
    }

    /// Close the request queue and wait for the worker to finish the
    /// requests already queued. Their responses are discarded.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            requests,
            responses,
            handle,
            ..
        } = self;
        drop(requests);
        handle.await.context("centrality worker panicked")?;
        drop(responses);
        tracing::debug!("Centrality worker shut down");
        Ok(())
    }
}
