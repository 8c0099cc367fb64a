//! Walk the story and dashboard steps

use anyhow::{Context, Result};
use marginalia_runtime::Session;
use serde_json::json;

/// Run the story command
pub async fn run(config_path: &str, json: bool) -> Result<()> {
    let session = Session::load(config_path)?;
    let config = session.config();

    let sections = [("story", &config.story), ("dashboard", &config.dashboard)];
    let mut summaries = Vec::new();

    for (section, steps) in sections {
        for (index, step) in steps.iter().enumerate() {
            let data = session
                .step_data(step)
                .with_context(|| format!("Failed to prepare {section} step {index}"))?;

            let network = data.network.as_ref().map(|n| {
                json!({
                    "nodes": n.nodes.len(),
                    "edges": n.edges.len(),
                })
            });

            summaries.push(json!({
                "section": section,
                "index": index,
                "view": step.view,
                "title": step.title,
                "rows": data.table.num_rows(),
                "columns": data.table.column_names(),
                "network": network,
            }));

            if !json {
                let view = step.view.as_deref().unwrap_or("text");
                let title = step.title.as_deref().unwrap_or("");
                print!(
                    "{section:<9} {index:>3}  {view:<9} {:>5} rows",
                    data.table.num_rows()
                );
                if let Some(n) = &data.network {
                    print!("  {} nodes / {} edges", n.nodes.len(), n.edges.len());
                }
                println!("  {title}");
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    Ok(())
}
