//! Transform interpreter
//!
//! Applies a [`TransformSpec`] to a [`Table`], producing a new table.

use crate::date::parse_cell;
use crate::error::Result;
use crate::table::{Cell, Table};
use crate::transforms::{FilterExpr, FilterSpec, Rollup, SortSpec, TransformSpec};

/// Name of the column added by [`derive_dates`]
pub const PARSED_DATE_COLUMN: &str = "parsed_date";

/// Apply a transform spec: filter, then sort, then group-by, then select.
///
/// `None` returns a copy of the input table.
pub fn apply_transform(table: &Table, spec: Option<&TransformSpec>) -> Result<Table> {
    let Some(spec) = spec else {
        return Ok(table.clone());
    };

    let mut current = table.clone();

    if let Some(filter) = &spec.filter {
        current = apply_filter(&current, filter)?;
    }

    if let Some(sort) = &spec.sort {
        current = apply_sort(&current, sort)?;
    }

    if let Some(group_by) = &spec.group_by {
        current = apply_group_by(&current, group_by, spec.rollup.as_deref())?;
    }

    if let Some(select) = &spec.select {
        current = current.select(select)?;
    }

    tracing::debug!(
        rows_in = table.num_rows(),
        rows_out = current.num_rows(),
        "Applied transform"
    );
    Ok(current)
}

fn apply_filter(table: &Table, filter: &FilterSpec) -> Result<Table> {
    let expr = FilterExpr::from_spec(filter)?;
    Ok(table.filter(|row| expr.matches(row.get(expr.column()))))
}

fn apply_sort(table: &Table, sort: &SortSpec) -> Result<Table> {
    table.order_by(sort.column(), sort.order())
}

fn apply_group_by(table: &Table, column: &str, rollup: Option<&str>) -> Result<Table> {
    match Rollup::from_name(rollup) {
        Rollup::Count => table.group_count(column),
    }
}

/// Append a `parsed_date` column holding epoch milliseconds (or missing)
/// for each value of `date_column`.
pub fn derive_dates(table: &Table, date_column: &str) -> Result<Table> {
    let values: Vec<Cell> = table
        .array(date_column)?
        .into_iter()
        .map(|cell| {
            parse_cell(cell)
                .timestamp_millis()
                .map(|ms| Cell::Number(ms as f64))
                .unwrap_or(Cell::Missing)
        })
        .collect();

    let parsed = values.iter().filter(|v| !v.is_missing()).count();
    tracing::debug!(
        "Derived {} dates from column '{}' ({} unparseable)",
        parsed,
        date_column,
        values.len() - parsed
    );

    table.with_column(PARSED_DATE_COLUMN, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::table::SortOrder;

    fn sample_table() -> Table {
        Table::from_records(vec![
            vec![("name", Cell::from("Alice")), ("year", Cell::from(1880)), ("type", Cell::from("letter"))],
            vec![("name", Cell::from("Bob")), ("year", Cell::from(1920)), ("type", Cell::from("letter"))],
            vec![("name", Cell::from("Charlie")), ("year", Cell::from(1950)), ("type", Cell::from("note"))],
            vec![("name", Cell::from("Diana")), ("year", Cell::from(1890)), ("type", Cell::from("letter"))],
            vec![("name", Cell::from("Eve")), ("year", Cell::from(2000)), ("type", Cell::from("note"))],
        ])
    }

    fn spec(yaml: &str) -> TransformSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn names(table: &Table) -> Vec<String> {
        table
            .array("name")
            .unwrap()
            .into_iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_filter_string_expression() {
        let result = apply_transform(&sample_table(), Some(&spec("filter: 'year > 1900'"))).unwrap();
        assert_eq!(result.num_rows(), 3);
        assert_eq!(names(&result), vec!["Bob", "Charlie", "Eve"]);
    }

    #[test]
    fn test_filter_string_equality() {
        let result =
            apply_transform(&sample_table(), Some(&spec("filter: \"type == 'note'\""))).unwrap();
        assert_eq!(names(&result), vec!["Charlie", "Eve"]);
    }

    #[test]
    fn test_filter_object_expression() {
        let result = apply_transform(
            &sample_table(),
            Some(&spec("filter:\n  column: type\n  value: note\n")),
        )
        .unwrap();
        assert_eq!(result.num_rows(), 2);
    }

    #[test]
    fn test_filter_on_absent_column_matches_nothing() {
        let result = apply_transform(&sample_table(), Some(&spec("filter: 'pages > 3'"))).unwrap();
        assert_eq!(result.num_rows(), 0);
    }

    #[test]
    fn test_malformed_filter_is_an_error() {
        let err = apply_transform(&sample_table(), Some(&spec("filter: 'year is big'"))).unwrap_err();
        assert!(matches!(err, Error::FilterParse { .. }));
    }

    #[test]
    fn test_sort_ascending() {
        let result = apply_transform(&sample_table(), Some(&spec("sort: year"))).unwrap();
        let years: Vec<f64> = result
            .array("year")
            .unwrap()
            .into_iter()
            .filter_map(Cell::as_number)
            .collect();
        assert!(years.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(years.first(), Some(&1880.0));
        assert_eq!(years.last(), Some(&2000.0));
    }

    #[test]
    fn test_sort_descending() {
        let result = apply_transform(
            &sample_table(),
            Some(&spec("sort:\n  column: year\n  order: desc\n")),
        )
        .unwrap();
        assert_eq!(names(&result)[0], "Eve");
    }

    #[test]
    fn test_group_by_counts() {
        let result = apply_transform(&sample_table(), Some(&spec("group_by: type"))).unwrap();
        assert_eq!(result.num_rows(), 2);
        assert_eq!(result.column_names(), &["type", "count"]);
        assert_eq!(result.get(0, "type"), Some(&Cell::from("letter")));
        assert_eq!(result.get(0, "count"), Some(&Cell::Number(3.0)));
        assert_eq!(result.get(1, "count"), Some(&Cell::Number(2.0)));
    }

    #[test]
    fn test_select_projects_in_order() {
        let result = apply_transform(&sample_table(), Some(&spec("select: [year, name]"))).unwrap();
        assert_eq!(result.column_names(), &["year", "name"]);
        assert_eq!(result.num_rows(), 5);
    }

    #[test]
    fn test_stages_run_in_fixed_order() {
        // select is listed first but must run last, after group_by
        let result = apply_transform(
            &sample_table(),
            Some(&spec("select: [count]\ngroup_by: type\nfilter: 'year > 1885'\n")),
        )
        .unwrap();
        assert_eq!(result.column_names(), &["count"]);
        assert_eq!(result.get(0, "count"), Some(&Cell::Number(2.0)));
    }

    #[test]
    fn test_none_spec_is_identity() {
        let table = sample_table();
        let result = apply_transform(&table, None).unwrap();
        assert_eq!(result, table);
        let result = apply_transform(&table, Some(&TransformSpec::default())).unwrap();
        assert_eq!(result.num_rows(), table.num_rows());
    }

    #[test]
    fn test_input_table_is_not_mutated() {
        let table = sample_table();
        let _ = apply_transform(&table, Some(&spec("group_by: type"))).unwrap();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.column_names().len(), 3);
    }

    #[test]
    fn test_unknown_sort_column_errors() {
        let err = apply_transform(&sample_table(), Some(&spec("sort: pages"))).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { operation: "sort", .. }));
    }

    #[test]
    fn test_derive_dates() {
        let table = Table::from_records(vec![
            vec![("date", Cell::from("1850-06-15"))],
            vec![("date", Cell::from("c. 1900"))],
            vec![("date", Cell::from("unparseable"))],
        ]);
        let result = derive_dates(&table, "date").unwrap();
        assert!(result.has_column(PARSED_DATE_COLUMN));
        let dates = result.array(PARSED_DATE_COLUMN).unwrap();
        assert_eq!(dates.len(), 3);
        assert!(!dates[0].is_missing());
        assert!(!dates[1].is_missing());
        assert!(dates[2].is_missing());
    }

    #[test]
    fn test_derive_dates_then_sort() {
        let table = Table::from_records(vec![
            vec![("date", Cell::from("1901"))],
            vec![("date", Cell::from("Winter 1850"))],
        ]);
        let derived = derive_dates(&table, "date").unwrap();
        let sorted = derived.order_by(PARSED_DATE_COLUMN, SortOrder::Asc).unwrap();
        assert_eq!(sorted.get(0, "date"), Some(&Cell::from("Winter 1850")));
    }

    #[test]
    fn test_derive_dates_unknown_column() {
        assert!(derive_dates(&sample_table(), "date").is_err());
    }
}
