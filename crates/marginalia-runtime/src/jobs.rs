//! Job definitions for the centrality worker
//!
//! Requests and responses are plain owned values: the worker rebuilds its own
//! graph from the transferred lists and shares no state with the caller.

use marginalia_core::network::{Edge, Node, compute_centrality};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Request to score a network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralityJob {
    /// Identifier echoed back in the response
    pub request_id: Uuid,

    /// Nodes to score
    pub nodes: Vec<Node>,

    /// Edges between them
    pub edges: Vec<Edge>,
}

impl CentralityJob {
    /// Create a job with a fresh request id
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            nodes,
            edges,
        }
    }

    /// Compute the response for this job. Failures become an error payload.
    pub fn execute(self) -> CentralityResponse {
        let node_count = self.nodes.len();
        let edge_count = self.edges.len();
        let outcome = match compute_centrality(&self.nodes, &self.edges) {
            Ok(centrality) => CentralityOutcome::Computed {
                centrality,
                node_count,
                edge_count,
            },
            Err(e) => CentralityOutcome::Failed {
                error: e.to_string(),
            },
        };
        CentralityResponse {
            request_id: self.request_id,
            outcome,
        }
    }
}

/// What the worker produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CentralityOutcome {
    /// Scores for every node
    Computed {
        /// Node id -> betweenness
        centrality: HashMap<String, f64>,
        /// Nodes received
        node_count: usize,
        /// Edges received (before de-duplication)
        edge_count: usize,
    },

    /// The computation failed; centrality is unavailable
    Failed {
        /// Error description
        error: String,
    },
}

/// Reply for one [`CentralityJob`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityResponse {
    /// Id of the job this answers
    pub request_id: Uuid,

    /// Result payload
    pub outcome: CentralityOutcome,
}

impl CentralityResponse {
    /// The scores, if the computation succeeded
    pub fn centrality(&self) -> Option<&HashMap<String, f64>> {
        match &self.outcome {
            CentralityOutcome::Computed { centrality, .. } => Some(centrality),
            CentralityOutcome::Failed { .. } => None,
        }
    }
}
