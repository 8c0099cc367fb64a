//! Show how a date column is read

use anyhow::Result;
use marginalia_core::date::parse_date_column;
use marginalia_runtime::Session;

/// Column used when no date role is configured
const DEFAULT_DATE_COLUMN: &str = "date";

/// Run the dates command
pub async fn run(config_path: &str, column: Option<&str>) -> Result<()> {
    let session = Session::load(config_path)?;
    let column = column
        .or_else(|| session.config().data.column("date"))
        .unwrap_or(DEFAULT_DATE_COLUMN);

    let values = session.table().array(column)?;
    let parsed = parse_date_column(values);

    let mut unparsed = 0;
    for entry in &parsed {
        let result = &entry.result;
        match result.date {
            Some(date) => {
                let marker = if result.approximate { " (approx.)" } else { "" };
                println!("{:>4}  {:<24} -> {}{}", entry.index, result.original, date, marker);
            }
            None => {
                unparsed += 1;
                println!("{:>4}  {:<24} -> unparsed", entry.index, result.original);
            }
        }
    }

    tracing::info!(
        "Parsed {} of {} values in '{}'",
        parsed.len() - unparsed,
        parsed.len(),
        column
    );
    Ok(())
}
