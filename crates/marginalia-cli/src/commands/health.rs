//! Data health report command

use anyhow::Result;
use marginalia_runtime::Session;

/// Run the health command
pub async fn run(config_path: &str, json: bool) -> Result<()> {
    let session = Session::load(config_path)?;
    let report = session.health();
    let diagnostics = session.diagnostics();

    if json {
        let output = serde_json::json!({
            "report": report,
            "warnings": session.warnings(),
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Rows: {}", report.row_count);
    println!("Columns:");
    for column in &report.columns {
        println!("  {:<20} {} missing", column, report.missing_in(column));
    }

    if !session.warnings().is_empty() {
        println!("Parse warnings:");
        for warning in session.warnings() {
            println!("  row {}: {}", warning.row, warning.message);
        }
    }

    println!("Diagnostics:");
    for diagnostic in &diagnostics {
        println!("  {diagnostic}");
    }

    Ok(())
}
