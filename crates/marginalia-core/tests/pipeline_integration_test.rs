//! Integration tests for the complete engine pipeline
//!
//! Tests use temporary directories with real file fixtures to verify:
//! - Config loading and exhaustive validation
//! - CSV loading relative to the project directory
//! - Date derivation, step transforms and network building end to end

use marginalia_core::config::CONFIG_FILE_NAME;
use marginalia_core::interpreter::{PARSED_DATE_COLUMN, apply_transform, derive_dates};
use marginalia_core::loader::{health_report, load_csv};
use marginalia_core::network::build_network;
use marginalia_core::{Cell, Error, NarrativeConfig};
use tempfile::TempDir;

const LETTERS_CSV: &str = "\
id,date,sender,recipient,type,year
1,1850-06-15,Alice,Bob,letter,1850
2,c. 1861,Bob,Charlie,letter,1861
3,Winter 1914,Alice,Charlie,note,1914
4,1902?,Charlie,Diana,letter,1902

5,unknown,Diana,Eve,note,
6,1920,Eve,,letter,1920
";

/// Helper to create a temporary project directory with standard structure.
fn setup_project(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/letters.csv"), LETTERS_CSV).unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), config).unwrap();
    dir
}

const CONFIG: &str = r#"
metadata:
  title: Letters of the Fitzroy Family
  author: Jane Doe
data:
  csv: /data/letters.csv
  columns:
    date: date
    source: sender
    target: recipient
story:
  - text: Everything begins with a letter.
    view: timeline
  - text: Who wrote to whom after 1855?
    view: network
    transform:
      filter: "year > 1855"
  - view: search
    transform:
      group_by: type
dashboard:
  - view: network
"#;

// =============================================================================
// Complete Pipeline Tests
// =============================================================================

#[test]
fn test_complete_pipeline() {
    let dir = setup_project(CONFIG);

    let config = NarrativeConfig::load(dir.path()).unwrap();
    assert_eq!(config.metadata.title.as_deref(), Some("Letters of the Fitzroy Family"));

    let parsed = load_csv(config.csv_path()).unwrap();
    assert!(parsed.warnings.is_empty());
    let table = parsed.table;
    assert_eq!(table.num_rows(), 6);

    let report = health_report(&table);
    assert_eq!(report.missing_in("recipient"), 1);
    assert_eq!(report.missing_in("year"), 1);

    let table = derive_dates(&table, config.data.column("date").unwrap()).unwrap();
    let dates = table.array(PARSED_DATE_COLUMN).unwrap();
    let parsed_count = dates.iter().filter(|d| !d.is_missing()).count();
    assert_eq!(parsed_count, 5);
    assert!(dates[4].is_missing());

    // Step 2: filtered network
    let step = &config.story[1];
    let data = apply_transform(&table, step.transform.as_ref()).unwrap();
    assert_eq!(data.num_rows(), 4);
    let network = build_network(
        &data,
        config.data.column_or_role("source"),
        config.data.column_or_role("target"),
    )
    .unwrap();
    // Eve's row has no recipient
    assert_eq!(network.edges.len(), 3);
    assert_eq!(network.nodes.len(), 4);
    assert_eq!(network.top_by_centrality(1)[0].id, "Charlie");

    // Step 3: grouped counts
    let grouped = apply_transform(&table, config.story[2].transform.as_ref()).unwrap();
    assert_eq!(grouped.num_rows(), 2);
    assert_eq!(grouped.get(0, "count"), Some(&Cell::Number(4.0)));
}

#[test]
fn test_full_network_from_dashboard() {
    let dir = setup_project(CONFIG);
    let config = NarrativeConfig::load(dir.path()).unwrap();
    let table = load_csv(config.csv_path()).unwrap().table;

    let network = build_network(&table, "sender", "recipient").unwrap();
    assert_eq!(network.nodes.len(), 5);
    assert_eq!(network.edges.len(), 5);
    let eve = network.nodes.iter().find(|n| n.id == "Eve").unwrap();
    assert_eq!(eve.centrality, 0.0);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_invalid_config_reports_every_violation() {
    let dir = setup_project("metadata: { title: T }\ndata: {}\nstory: {}\n");
    let err = NarrativeConfig::load(dir.path()).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("data.csv"));
    assert!(errors[1].contains("story"));
}

#[test]
fn test_empty_config_file() {
    let dir = setup_project("");
    let err = NarrativeConfig::load(dir.path()).unwrap_err();
    assert!(matches!(err, Error::ConfigEmpty));
}

#[test]
fn test_missing_csv_is_fatal() {
    let dir = setup_project(
        "metadata: { title: T }\ndata: { csv: data/missing.csv }\nstory: []\n",
    );
    let config = NarrativeConfig::load(dir.path()).unwrap();
    let err = load_csv(config.csv_path()).unwrap_err();
    assert!(err.to_string().contains("missing.csv"));
}
