//! Initialize a new essay project

use anyhow::Result;
use marginalia_core::config::CONFIG_FILE_NAME;
use std::fs;
use std::path::Path;

const SAMPLE_CSV: &str = "\
id,date,sender,recipient,type,year
1,1850-06-15,Alice,Bob,letter,1850
2,c. 1861,Bob,Charlie,letter,1861
3,Winter 1914,Charlie,Diana,note,1914
4,1902?,Bob,Diana,letter,1902
5,[1920],Diana,Eve,postcard,1920
6,unknown,Eve,Bob,note,
";

/// Run the init command
pub async fn run(path: &str, title: Option<&str>) -> Result<()> {
    let project_dir = Path::new(path);

    if !project_dir.exists() {
        fs::create_dir_all(project_dir)?;
    }

    let abs_path = project_dir.canonicalize()?;

    let title = match title {
        Some(t) => t.to_string(),
        None => abs_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Could not determine essay title from path"))?,
    };

    if project_dir.join(CONFIG_FILE_NAME).exists() {
        anyhow::bail!(
            "Directory '{}' already contains a {}",
            project_dir.display(),
            CONFIG_FILE_NAME
        );
    }

    tracing::info!("Creating new essay: {}", title);

    // A JSON string is a valid YAML double-quoted scalar
    let quoted_title = serde_json::to_string(&title)?;
    let config = format!(
        r#"# Marginalia essay configuration
metadata:
  title: {quoted_title}
  author: Anonymous
  description: A short essay about a family's letters

data:
  csv: data/letters.csv
  columns:
    date: date
    source: sender
    target: recipient

story:
  - title: Beginnings
    text: The first letter was sent in the summer of 1850.
    view: timeline

  - text: After 1860 the correspondence widened.
    view: network
    transform:
      filter: "year > 1860"

  - text: Most of what survives are letters.
    view: search
    transform:
      group_by: type

dashboard:
  - title: Everyone
    view: network
"#
    );
    fs::write(project_dir.join(CONFIG_FILE_NAME), config)?;

    fs::create_dir_all(project_dir.join("data"))?;
    fs::write(project_dir.join("data/letters.csv"), SAMPLE_CSV)?;

    tracing::info!("✓ Created essay '{}' at {}", title, abs_path.display());
    tracing::info!("");
    tracing::info!("Next steps:");
    if path != "." {
        tracing::info!("  cd {}", project_dir.display());
    }
    tracing::info!("  marginalia validate    # Check configuration");
    tracing::info!("  marginalia story       # Walk through the steps");

    Ok(())
}
