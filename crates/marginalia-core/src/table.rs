//! Immutable tables of typed cells
//!
//! A [`Table`] is an ordered list of unique column names plus row-major cell
//! data. Every operation that changes the shape or content of a table returns
//! a new table; the input is never mutated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

static NUMBER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?\s*$").expect("valid number regex")
});

/// A single typed table value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// Numeric value
    Number(f64),
    /// Any non-numeric text
    Text(String),
    /// Empty or null value
    #[default]
    Missing,
}

impl Cell {
    /// Type a raw CSV field: empty is missing, number literals are numeric.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::Missing;
        }
        match parse_number(raw) {
            Some(n) => Self::Number(n),
            None => Self::Text(raw.to_string()),
        }
    }

    /// Whether this value counts as missing (null or empty text)
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Numeric view of the value, parsing numeric text
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_number(s),
            Self::Missing => None,
        }
    }

    /// Text view of the value, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Loose equality: numbers compare numerically against numeric text,
    /// missing only equals missing.
    pub fn loose_eq(&self, other: &Cell) -> bool {
        match (self, other) {
            (Self::Missing, Self::Missing) => true,
            (Self::Missing, _) | (_, Self::Missing) => false,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(n), Self::Text(t)) | (Self::Text(t), Self::Number(n)) => {
                parse_number(t).is_some_and(|v| v == *n)
            }
        }
    }

    /// Ordering for relational comparisons; `None` when the pair is not comparable.
    pub fn compare(&self, other: &Cell) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Number(a), Self::Text(t)) => parse_number(t).and_then(|b| a.partial_cmp(&b)),
            (Self::Text(t), Self::Number(b)) => parse_number(t).and_then(|a| a.partial_cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting: numbers, then text, then missing.
    fn sort_rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Text(_) => 1,
            Self::Missing => 2,
        }
    }

    /// Convert to a JSON value for row export
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Missing => serde_json::Value::Null,
        }
    }

    /// Convert a JSON literal (e.g. from a transform spec) to a cell
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Missing),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("null"),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

/// Parse text as a number literal (decimal with optional exponent).
pub fn parse_number(raw: &str) -> Option<f64> {
    if !NUMBER_LITERAL.is_match(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok()
}

/// Direction of a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// An immutable table of typed cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from column names and rows.
    ///
    /// Rows shorter than the header are padded with [`Cell::Missing`],
    /// longer rows are truncated.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Missing);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a table from row mappings; columns appear in first-seen order.
    pub fn from_records<I, R, K>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, Cell)>,
        K: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut rows: Vec<Vec<Cell>> = Vec::new();

        for record in records {
            let mut row = vec![Cell::Missing; columns.len()];
            for (key, value) in record {
                let key = key.into();
                let idx = match index.get(&key) {
                    Some(&idx) => idx,
                    None => {
                        index.insert(key.clone(), columns.len());
                        columns.push(key);
                        columns.len() - 1
                    }
                };
                if row.len() <= idx {
                    row.resize(idx + 1, Cell::Missing);
                }
                row[idx] = value;
            }
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    /// Column names in table order
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has the named column
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    fn require_column(&self, column: &str, operation: &'static str) -> Result<usize> {
        self.column_index(column).ok_or_else(|| Error::UnknownColumn {
            column: column.to_string(),
            operation,
        })
    }

    /// All values of one column, in row order
    pub fn array(&self, column: &str) -> Result<Vec<&Cell>> {
        let idx = self.require_column(column, "array")?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// A single value; `None` if the row or column does not exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterate over rows as `(column, value)` pairs
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = (&str, &Cell)>> {
        self.rows
            .iter()
            .map(move |row| self.columns.iter().map(String::as_str).zip(row.iter()))
    }

    /// Export rows as JSON objects keyed by column name
    pub fn objects(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows()
            .map(|row| row.map(|(k, v)| (k.to_string(), v.to_json())).collect())
            .collect()
    }

    /// Keep the rows for which `predicate` holds; the predicate sees a row accessor.
    pub fn filter<F>(&self, mut predicate: F) -> Table
    where
        F: FnMut(&RowRef<'_>) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|cells| {
                predicate(&RowRef {
                    columns: &self.columns,
                    cells,
                })
            })
            .cloned()
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Stable sort by one column
    pub fn order_by(&self, column: &str, order: SortOrder) -> Result<Table> {
        let idx = self.require_column(column, "sort")?;
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| sort_cells(&a[idx], &b[idx], order));
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// One row per distinct value of `column`, with a `count` column
    pub fn group_count(&self, column: &str) -> Result<Table> {
        let idx = self.require_column(column, "group_by")?;
        let mut groups: Vec<(Cell, usize)> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();

        for row in &self.rows {
            let cell = &row[idx];
            let key = GroupKey::from(cell);
            match index.get(&key) {
                Some(&g) => groups[g].1 += 1,
                None => {
                    index.insert(key, groups.len());
                    groups.push((cell.clone(), 1));
                }
            }
        }

        let rows = groups
            .into_iter()
            .map(|(value, count)| vec![value, Cell::Number(count as f64)])
            .collect();
        Ok(Table {
            columns: vec![column.to_string(), "count".to_string()],
            rows,
        })
    }

    /// Project onto the given columns, in the given order.
    ///
    /// A column named more than once appears once, at its first position.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let idx = self.require_column(column.as_ref(), "select")?;
            if !indices.contains(&idx) {
                indices.push(idx);
            }
        }
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows,
        })
    }

    /// Add a column, replacing any existing column of the same name.
    ///
    /// `values` must hold one cell per row.
    pub fn with_column(&self, name: &str, values: Vec<Cell>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(Error::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }

        let mut columns = self.columns.clone();
        let mut rows = self.rows.clone();
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                columns.push(name.to_string());
                for (row, value) in rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(Table { columns, rows })
    }
}

/// Borrowed view of one row, used by [`Table::filter`]
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl RowRef<'_> {
    /// Value of a column; [`Cell::Missing`] when the column does not exist
    pub fn get(&self, column: &str) -> &Cell {
        static MISSING: Cell = Cell::Missing;
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.cells[i])
            .unwrap_or(&MISSING)
    }
}

fn sort_cells(a: &Cell, b: &Cell, order: SortOrder) -> Ordering {
    let (ra, rb) = (a.sort_rank(), b.sort_rank());
    // Missing stays last in either direction
    if ra == 2 || rb == 2 {
        return ra.cmp(&rb);
    }
    let ordering = ra
        .cmp(&rb)
        .then_with(|| a.compare(b).unwrap_or(Ordering::Equal));
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Number(u64),
    Text(String),
    Missing,
}

impl From<&Cell> for GroupKey {
    fn from(cell: &Cell) -> Self {
        match cell {
            // Normalize -0.0 so it groups with 0.0
            Cell::Number(n) if *n == 0.0 => Self::Number(0.0_f64.to_bits()),
            Cell::Number(n) => Self::Number(n.to_bits()),
            Cell::Text(s) => Self::Text(s.clone()),
            Cell::Missing => Self::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> Table {
        Table::from_records(vec![
            vec![("name", Cell::from("Alice")), ("year", Cell::from(1880))],
            vec![("name", Cell::from("Bob")), ("year", Cell::from(1920))],
            vec![("name", Cell::from("Carol")), ("year", Cell::Missing)],
        ])
    }

    #[test]
    fn test_infer_cell_types() {
        assert_eq!(Cell::infer("1850"), Cell::Number(1850.0));
        assert_eq!(Cell::infer("-2.5e3"), Cell::Number(-2500.0));
        assert_eq!(Cell::infer("Alice"), Cell::Text("Alice".into()));
        assert_eq!(Cell::infer("1850-06-15"), Cell::Text("1850-06-15".into()));
        assert_eq!(Cell::infer(""), Cell::Missing);
        assert_eq!(Cell::infer("inf"), Cell::Text("inf".into()));
    }

    #[test]
    fn test_loose_equality() {
        assert!(Cell::from(1900).loose_eq(&Cell::from("1900")));
        assert!(!Cell::from(1900).loose_eq(&Cell::from("abc")));
        assert!(Cell::Missing.loose_eq(&Cell::Missing));
        assert!(!Cell::Missing.loose_eq(&Cell::from("")));
    }

    #[test]
    fn test_compare_with_missing_is_none() {
        assert_eq!(Cell::Missing.compare(&Cell::from(1)), None);
        assert_eq!(
            Cell::from(2).compare(&Cell::from(1)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_display_integral_number() {
        assert_eq!(Cell::from(1850).to_string(), "1850");
        assert_eq!(Cell::Number(1850.5).to_string(), "1850.5");
    }

    #[test]
    fn test_from_records_first_seen_columns() {
        let table = Table::from_records(vec![
            vec![("a", Cell::from(1))],
            vec![("b", Cell::from(2)), ("a", Cell::from(3))],
        ]);
        assert_eq!(table.column_names(), &["a", "b"]);
        assert_eq!(table.get(0, "b"), Some(&Cell::Missing));
        assert_eq!(table.get(1, "a"), Some(&Cell::from(3)));
    }

    #[test]
    fn test_order_by_keeps_missing_last() {
        let table = letters();
        let asc = table.order_by("year", SortOrder::Asc).unwrap();
        let desc = table.order_by("year", SortOrder::Desc).unwrap();
        assert_eq!(asc.get(0, "name"), Some(&Cell::from("Alice")));
        assert_eq!(desc.get(0, "name"), Some(&Cell::from("Bob")));
        assert_eq!(desc.get(2, "name"), Some(&Cell::from("Carol")));
    }

    #[test]
    fn test_with_column_does_not_mutate_input() {
        let table = letters();
        let extended = table
            .with_column("flag", vec![Cell::from(1), Cell::from(0), Cell::Missing])
            .unwrap();
        assert_eq!(table.column_names().len(), 2);
        assert_eq!(extended.column_names().len(), 3);
    }

    #[test]
    fn test_with_column_rejects_wrong_length() {
        let result = letters().with_column("flag", vec![Cell::from(1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_unknown_column_errors() {
        let err = letters().select(&["nope"]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_select_repeated_column_appears_once() {
        let table = letters().select(&["year", "name", "year"]).unwrap();
        assert_eq!(table.column_names(), &["year", "name"]);
        assert_eq!(table.get(1, "name"), Some(&Cell::from("Bob")));
        assert_eq!(table.objects()[0].len(), 2);
    }

    #[test]
    fn test_objects_export() {
        let objects = letters().objects();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0]["name"], "Alice");
        assert_eq!(objects[2]["year"], serde_json::Value::Null);
    }
}
