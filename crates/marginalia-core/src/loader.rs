//! CSV ingestion and data health reports
//!
//! CSV text is parsed header-first into a [`Table`]. Each field is typed on
//! the way in (see [`Cell::infer`]). Malformed rows never abort a load: they
//! are recorded as [`ParseWarning`]s and the best-effort table is returned.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Error, Result};
use crate::table::{Cell, Table};

/// Kind of problem found in a CSV row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Row had fewer fields than the header
    TooFewFields,
    /// Row had more fields than the header
    TooManyFields,
    /// Row could not be decoded at all
    Malformed,
}

/// A non-fatal problem encountered while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// 1-based data row (the header is row 0)
    pub row: usize,
    /// What went wrong
    pub kind: WarningKind,
    /// Human-readable description
    pub message: String,
}

/// Result of parsing CSV text
#[derive(Debug, Clone)]
pub struct CsvParse {
    /// The best-effort table
    pub table: Table,
    /// Problems found along the way
    pub warnings: Vec<ParseWarning>,
}

/// Parse CSV text into a table.
///
/// Blank lines are skipped. Short rows are padded with missing values,
/// long rows are truncated to the header width.
pub fn parse_csv(text: &str) -> CsvParse {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut warnings = Vec::new();

    let header: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(str::to_string).collect(),
        Err(e) => {
            warnings.push(ParseWarning {
                row: 0,
                kind: WarningKind::Malformed,
                message: e.to_string(),
            });
            Vec::new()
        }
    };

    // Duplicate header names keep their first position; the later field wins
    let mut columns: Vec<String> = Vec::new();
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    let targets: Vec<usize> = header
        .iter()
        .map(|name| {
            *slot_of.entry(name.as_str()).or_insert_with(|| {
                columns.push(name.clone());
                columns.len() - 1
            })
        })
        .collect();

    let mut rows = Vec::new();
    let mut data_row = 0;

    for record in reader.records() {
        data_row += 1;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warnings.push(ParseWarning {
                    row: data_row,
                    kind: WarningKind::Malformed,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if record.is_empty() || (record.len() == 1 && record[0].is_empty()) {
            data_row -= 1;
            continue;
        }

        if record.len() < header.len() {
            warnings.push(ParseWarning {
                row: data_row,
                kind: WarningKind::TooFewFields,
                message: format!(
                    "expected {} fields but parsed {}",
                    header.len(),
                    record.len()
                ),
            });
        } else if record.len() > header.len() {
            warnings.push(ParseWarning {
                row: data_row,
                kind: WarningKind::TooManyFields,
                message: format!(
                    "expected {} fields but parsed {}",
                    header.len(),
                    record.len()
                ),
            });
        }

        let mut row = vec![Cell::Missing; columns.len()];
        for (field, &slot) in record.iter().zip(targets.iter()) {
            row[slot] = Cell::infer(field);
        }
        rows.push(row);
    }

    for warning in &warnings {
        tracing::warn!(row = warning.row, kind = ?warning.kind, "CSV parse warning: {}", warning.message);
    }

    CsvParse {
        table: Table::new(columns, rows),
        warnings,
    }
}

/// Read and parse a CSV file. Failure to read the file is fatal.
pub fn load_csv(path: impl AsRef<Path>) -> Result<CsvParse> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::DataLoad {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!("Loaded {} bytes of CSV from {}", text.len(), path.display());
    Ok(parse_csv(&text))
}

/// Row count, columns and per-column missing-value counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Number of rows
    pub row_count: usize,
    /// Column names in table order
    pub columns: Vec<String>,
    /// Missing (null or empty) values per column, keyed in sorted order
    pub missing: BTreeMap<String, usize>,
}

impl HealthReport {
    /// Missing count for one column (0 for unknown columns)
    pub fn missing_in(&self, column: &str) -> usize {
        self.missing.get(column).copied().unwrap_or(0)
    }
}

/// Compute a health report in one pass per column.
pub fn health_report(table: &Table) -> HealthReport {
    let columns = table.column_names().to_vec();
    let mut missing = BTreeMap::new();

    for column in &columns {
        let count = table
            .array(column)
            .map(|values| values.into_iter().filter(|v| v.is_missing()).count())
            .unwrap_or(0);
        missing.insert(column.clone(), count);
    }

    HealthReport {
        row_count: table.num_rows(),
        columns,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_types_cells() {
        let parsed = parse_csv("name,year,date\nAlice,1850,c. 1850\nBob,1920.5,\n");
        let table = parsed.table;
        assert!(parsed.warnings.is_empty());
        assert_eq!(table.column_names(), &["name", "year", "date"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.get(0, "year"), Some(&Cell::Number(1850.0)));
        assert_eq!(table.get(1, "year"), Some(&Cell::Number(1920.5)));
        assert_eq!(table.get(0, "date"), Some(&Cell::Text("c. 1850".into())));
        assert_eq!(table.get(1, "date"), Some(&Cell::Missing));
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let parsed = parse_csv("a,b\n1,2\n\n3,4\n\n");
        assert_eq!(parsed.table.num_rows(), 2);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_parse_records_short_and_long_rows() {
        let parsed = parse_csv("a,b\n1\n2,3,4\n5,6\n");
        assert_eq!(parsed.table.num_rows(), 3);
        assert_eq!(parsed.warnings.len(), 2);
        assert_eq!(parsed.warnings[0].kind, WarningKind::TooFewFields);
        assert_eq!(parsed.warnings[0].row, 1);
        assert_eq!(parsed.warnings[1].kind, WarningKind::TooManyFields);
        assert_eq!(parsed.table.get(0, "b"), Some(&Cell::Missing));
        assert_eq!(parsed.table.get(1, "b"), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn test_parse_duplicate_headers() {
        let parsed = parse_csv("a,b,a\n1,2,3\n");
        assert_eq!(parsed.table.column_names(), &["a", "b"]);
        assert_eq!(parsed.table.get(0, "a"), Some(&Cell::Number(3.0)));
    }

    #[test]
    fn test_parse_quoted_fields() {
        let parsed = parse_csv("title,year\n\"Letters, vol. 1\",1850\n");
        assert_eq!(
            parsed.table.get(0, "title"),
            Some(&Cell::Text("Letters, vol. 1".into()))
        );
    }

    #[test]
    fn test_health_report_counts_missing() {
        let parsed = parse_csv("a,b\n1,\n,x\n3,y\n");
        let report = health_report(&parsed.table);
        assert_eq!(report.row_count, 3);
        assert_eq!(report.columns, vec!["a", "b"]);
        assert_eq!(report.missing_in("a"), 1);
        assert_eq!(report.missing_in("b"), 1);
    }

    #[test]
    fn test_health_report_json_is_stable() {
        let parsed = parse_csv("zeta,alpha,mid\n1,,\n,2,3\n");
        let json = serde_json::to_string(&health_report(&parsed.table)).unwrap();
        assert!(json.ends_with(r#""missing":{"alpha":1,"mid":1,"zeta":1}}"#));
        assert_eq!(json, serde_json::to_string(&health_report(&parsed.table)).unwrap());
    }

    #[test]
    fn test_health_report_counts_empty_text_as_missing() {
        let table = Table::from_records(vec![
            vec![("a", Cell::Text(String::new()))],
            vec![("a", Cell::Missing)],
            vec![("a", Cell::from("ok"))],
        ]);
        assert_eq!(health_report(&table).missing_in("a"), 2);
    }

    #[test]
    fn test_load_csv_missing_file_is_fatal() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::DataLoad { .. }));
    }
}
