//! Relationship networks: extraction and betweenness centrality
//!
//! Two table columns (source and target) describe who is connected to whom.
//! Extraction turns them into a node/edge list; centrality builds a simple
//! undirected graph from that list and scores every node with Brandes'
//! betweenness algorithm.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::table::Table;

/// A node in the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Trimmed cell text identifying the node
    pub id: String,
    /// Betweenness centrality (0 until computed)
    #[serde(default)]
    pub centrality: f64,
}

impl Node {
    /// A node with no score yet
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            centrality: 0.0,
        }
    }
}

/// A connection between two nodes; direction is ignored for analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// One endpoint
    pub source: String,
    /// The other endpoint
    pub target: String,
}

impl Edge {
    /// Create an edge
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether both endpoints are the same node
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Extracted nodes and edges, optionally scored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkView {
    /// Unique nodes in first-seen order
    pub nodes: Vec<Node>,
    /// One edge per surviving row (duplicates kept)
    pub edges: Vec<Edge>,
}

impl NetworkView {
    /// Nodes ordered by descending centrality, ties broken by id
    pub fn top_by_centrality(&self, k: usize) -> Vec<&Node> {
        let mut ranked: Vec<&Node> = self.nodes.iter().collect();
        ranked.sort_by(|a, b| {
            b.centrality
                .total_cmp(&a.centrality)
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked.truncate(k);
        ranked
    }

    /// Attach scores from a centrality map; absent nodes score 0
    pub fn with_centrality(mut self, centrality: &HashMap<String, f64>) -> Self {
        for node in &mut self.nodes {
            node.centrality = centrality.get(&node.id).copied().unwrap_or(0.0);
        }
        self
    }
}

/// Extract a node/edge list from two columns.
///
/// Rows where either endpoint is missing or blank after trimming are dropped.
pub fn extract_network(table: &Table, source_column: &str, target_column: &str) -> Result<NetworkView> {
    let sources = table.array(source_column)?;
    let targets = table.array(target_column)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for (s, t) in sources.into_iter().zip(targets) {
        if s.is_missing() || t.is_missing() {
            continue;
        }
        let s = s.to_string().trim().to_string();
        let t = t.to_string().trim().to_string();
        if s.is_empty() || t.is_empty() {
            continue;
        }

        for id in [&s, &t] {
            if seen.insert(id.clone()) {
                nodes.push(Node::new(id.clone()));
            }
        }
        edges.push(Edge::new(s, t));
    }

    tracing::debug!(
        "Extracted {} nodes and {} edges from '{}' -> '{}'",
        nodes.len(),
        edges.len(),
        source_column,
        target_column
    );
    Ok(NetworkView { nodes, edges })
}

/// Simple undirected graph over dense node indices
#[derive(Debug, Clone)]
pub struct Graph {
    ids: Vec<String>,
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Graph {
    /// Build from nodes and edges. Duplicate edges collapse, self-loops are
    /// skipped, and an edge naming an unknown node is an error.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Result<Self> {
        let mut ids: Vec<String> = Vec::with_capacity(nodes.len());
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if !index.contains_key(node.id.as_str()) {
                index.insert(node.id.as_str(), ids.len());
                ids.push(node.id.clone());
            }
        }

        let mut adjacency = vec![Vec::new(); ids.len()];
        let mut pairs: HashSet<(usize, usize)> = HashSet::new();

        for edge in edges {
            if edge.is_self_loop() {
                continue;
            }
            let lookup = |id: &str| {
                index.get(id).copied().ok_or_else(|| Error::Network {
                    message: format!("edge references unknown node '{}'", id),
                })
            };
            let a = lookup(&edge.source)?;
            let b = lookup(&edge.target)?;
            if pairs.insert((a.min(b), a.max(b))) {
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }

        Ok(Self {
            ids,
            adjacency,
            edge_count: pairs.len(),
        })
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Betweenness centrality via Brandes' algorithm.
    ///
    /// Sums over every ordered pair of distinct endpoints, unnormalized.
    pub fn betweenness(&self) -> HashMap<String, f64> {
        let n = self.ids.len();
        let mut bc = vec![0.0_f64; n];

        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1i64; n];
        let mut delta = vec![0.0_f64; n];
        let mut queue = VecDeque::with_capacity(n);

        for s in 0..n {
            stack.clear();
            for p in predecessors.iter_mut() {
                p.clear();
            }
            sigma.fill(0.0);
            dist.fill(-1);
            delta.fill(0.0);

            sigma[s] = 1.0;
            dist[s] = 0;
            queue.push_back(s);

            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &w in &self.adjacency[v] {
                    if dist[w] < 0 {
                        queue.push_back(w);
                        dist[w] = dist[v] + 1;
                    }
                    if dist[w] == dist[v] + 1 {
                        sigma[w] += sigma[v];
                        predecessors[w].push(v);
                    }
                }
            }

            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                }
                if w != s {
                    bc[w] += delta[w];
                }
            }
        }

        self.ids.iter().cloned().zip(bc).collect()
    }
}

/// Score every node by betweenness centrality.
pub fn compute_centrality(nodes: &[Node], edges: &[Edge]) -> Result<HashMap<String, f64>> {
    let graph = Graph::build(nodes, edges)?;
    tracing::debug!(
        "Computing betweenness over {} nodes / {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph.betweenness())
}

/// Extract a network and attach centrality scores.
pub fn build_network(table: &Table, source_column: &str, target_column: &str) -> Result<NetworkView> {
    let view = extract_network(table, source_column, target_column)?;
    let centrality = compute_centrality(&view.nodes, &view.edges)?;
    Ok(view.with_centrality(&centrality))
}
