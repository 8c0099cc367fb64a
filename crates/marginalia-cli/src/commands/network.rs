//! Relationship network command

use anyhow::Result;
use marginalia_core::network::extract_network;
use marginalia_runtime::{CentralityOutcome, CentralityWorker, Session};

/// Run the network command
pub async fn run(
    config_path: &str,
    source: Option<&str>,
    target: Option<&str>,
    top: usize,
) -> Result<()> {
    let session = Session::load(config_path)?;
    let data = &session.config().data;
    let source = source.unwrap_or_else(|| data.column_or_role("source"));
    let target = target.unwrap_or_else(|| data.column_or_role("target"));

    let network = extract_network(session.table(), source, target)?;
    tracing::info!(
        "Network '{}' -> '{}': {} nodes, {} edges",
        source,
        target,
        network.nodes.len(),
        network.edges.len()
    );

    let mut client = CentralityWorker::spawn();
    client
        .submit(network.nodes.clone(), network.edges.clone())
        .await?;
    let response = client.recv_latest().await?;
    client.shutdown().await?;

    let centrality = match response.outcome {
        CentralityOutcome::Computed { centrality, .. } => centrality,
        CentralityOutcome::Failed { error } => {
            anyhow::bail!("Centrality computation failed: {}", error)
        }
    };

    let network = network.with_centrality(&centrality);
    for (rank, node) in network.top_by_centrality(top).into_iter().enumerate() {
        println!("{:>3}. {:<24} {:.2}", rank + 1, node.id, node.centrality);
    }

    Ok(())
}
