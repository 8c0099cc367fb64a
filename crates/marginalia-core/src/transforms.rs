//! Transform spec configuration
//!
//! A step in the story may reshape the dataset before it is shown. Transform
//! specs are parsed here and executed by [`crate::interpreter`].
//!
//! # Stages
//!
//! Stages always run in this order, each only when present:
//!
//! - `filter` - keep rows matching `"<column> <op> <value>"` or `{column, value}`
//! - `sort` - order by a column, ascending unless `order: desc`
//! - `group_by` - one row per distinct value with a `count` (the only `rollup`)
//! - `select` - project to a list of columns
//!
//! # Example
//!
//! ```yaml
//! transform:
//!   filter: "year > 1900"
//!   sort:
//!     column: year
//!     order: desc
//!   select: [name, year]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::table::{Cell, SortOrder, parse_number};

/// Filter stage as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSpec {
    /// Comparison expression, e.g. `"year > 1900"`
    Expression(String),
    /// Equality match on one column
    Match {
        /// Column to compare
        column: String,
        /// Value the column must loosely equal
        #[serde(default)]
        value: serde_json::Value,
    },
}

/// Sort stage as written in YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    /// Bare column name, ascending
    Column(String),
    /// Column with explicit direction
    Ordered {
        /// Column to sort by
        column: String,
        /// Direction; anything other than `desc` sorts ascending
        #[serde(default)]
        order: Option<String>,
    },
}

impl SortSpec {
    /// Column being sorted
    pub fn column(&self) -> &str {
        match self {
            Self::Column(c) | Self::Ordered { column: c, .. } => c,
        }
    }

    /// Effective sort direction
    pub fn order(&self) -> SortOrder {
        match self {
            Self::Ordered { order: Some(o), .. } if o == "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Aggregation applied per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rollup {
    /// Number of rows in the group
    #[default]
    Count,
}

impl Rollup {
    /// Resolve a rollup name; unknown names fall back to `count`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("count") | None => Self::Count,
            Some(other) => {
                tracing::debug!("Unsupported rollup '{}', using count", other);
                Self::Count
            }
        }
    }
}

/// Declarative transform attached to a story step or dashboard panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    /// Row filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,

    /// Row ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,

    /// Grouping column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    /// Per-group aggregation name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollup: Option<String>,

    /// Output columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
}

impl TransformSpec {
    /// Whether no stage is requested
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.sort.is_none()
            && self.group_by.is_none()
            && self.select.is_none()
    }
}

/// Relational operator in a filter expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `==` (loose)
    Eq,
    /// `!=` (loose)
    Ne,
}

impl CompareOp {
    /// Operators in longest-match order
    const TOKENS: [(&'static str, CompareOp); 6] = [
        (">=", CompareOp::Ge),
        ("<=", CompareOp::Le),
        ("!=", CompareOp::Ne),
        ("==", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
    ];

    /// Apply the operator to a cell and a literal
    pub fn eval(self, lhs: &Cell, rhs: &Cell) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Self::Eq => lhs.loose_eq(rhs),
            Self::Ne => !lhs.loose_eq(rhs),
            Self::Gt => lhs.compare(rhs) == Some(Greater),
            Self::Lt => lhs.compare(rhs) == Some(Less),
            Self::Ge => matches!(lhs.compare(rhs), Some(Greater | Equal)),
            Self::Le => matches!(lhs.compare(rhs), Some(Less | Equal)),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = Self::TOKENS
            .iter()
            .find(|(_, op)| op == self)
            .map(|(t, _)| *t)
            .unwrap_or("?");
        f.write_str(token)
    }
}

/// Parsed filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `<column> <op> <literal>`
    Compare {
        /// Column name
        column: String,
        /// Operator
        op: CompareOp,
        /// Right-hand literal
        literal: Cell,
    },
    /// `{column, value}` loose equality
    Equals {
        /// Column name
        column: String,
        /// Value to match
        value: Cell,
    },
}

impl FilterExpr {
    /// Parse a filter spec into an expression.
    pub fn from_spec(spec: &FilterSpec) -> Result<Self> {
        match spec {
            FilterSpec::Expression(expr) => parse_filter(expr),
            FilterSpec::Match { column, value } => Ok(Self::Equals {
                column: column.clone(),
                value: Cell::from_json(value),
            }),
        }
    }

    /// Column the filter reads
    pub fn column(&self) -> &str {
        match self {
            Self::Compare { column, .. } | Self::Equals { column, .. } => column,
        }
    }

    /// Evaluate against one row value
    pub fn matches(&self, cell: &Cell) -> bool {
        match self {
            Self::Compare { op, literal, .. } => op.eval(cell, literal),
            Self::Equals { value, .. } => cell.loose_eq(value),
        }
    }
}

/// Parse `"<column> <op> <value>"`.
///
/// The column is a run of word characters; the value is a number when it
/// reads as one, otherwise a string with all quote characters removed.
pub fn parse_filter(expression: &str) -> Result<FilterExpr> {
    let fail = |message: &str| Error::FilterParse {
        expression: expression.to_string(),
        message: message.to_string(),
    };

    let column_end = expression
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(expression.len());
    if column_end == 0 {
        return Err(fail("expected a column name at the start"));
    }
    let column = &expression[..column_end];

    let rest = expression[column_end..].trim_start();
    let (op, rest) = CompareOp::TOKENS
        .iter()
        .find_map(|(token, op)| rest.strip_prefix(*token).map(|r| (*op, r)))
        .ok_or_else(|| fail("expected one of >, <, >=, <=, ==, != after the column"))?;

    let raw = rest.trim();
    if raw.is_empty() {
        return Err(fail("expected a value after the operator"));
    }

    let literal = match parse_number(raw) {
        Some(n) => Cell::Number(n),
        None => Cell::Text(raw.replace(['\'', '"'], "")),
    };

    Ok(FilterExpr::Compare {
        column: column.to_string(),
        op,
        literal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_full_spec() {
        let yaml = r#"
filter: "year > 1900"
sort:
  column: year
  order: desc
group_by: type
rollup: count
select: [type, count]
"#;
        let spec: TransformSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.filter, Some(FilterSpec::Expression("year > 1900".into())));
        let sort = spec.sort.unwrap();
        assert_eq!(sort.column(), "year");
        assert_eq!(sort.order(), SortOrder::Desc);
        assert_eq!(spec.group_by.as_deref(), Some("type"));
        assert_eq!(spec.select.unwrap(), vec!["type", "count"]);
    }

    #[test]
    fn test_parse_object_filter_and_bare_sort() {
        let yaml = r#"
filter:
  column: type
  value: letter
sort: date
"#;
        let spec: TransformSpec = serde_yaml::from_str(yaml).unwrap();
        match spec.filter.unwrap() {
            FilterSpec::Match { column, value } => {
                assert_eq!(column, "type");
                assert_eq!(value, serde_json::json!("letter"));
            }
            _ => panic!("Expected match filter"),
        }
        assert_eq!(spec.sort.unwrap().order(), SortOrder::Asc);
    }

    #[test]
    fn test_unknown_sort_order_is_ascending() {
        let sort = SortSpec::Ordered {
            column: "year".into(),
            order: Some("DESC".into()),
        };
        assert_eq!(sort.order(), SortOrder::Asc);
    }

    #[test]
    fn test_empty_spec() {
        let spec: TransformSpec = serde_yaml::from_str("{}").unwrap();
        assert!(spec.is_empty());
    }

    #[rstest]
    #[case("year > 1900", CompareOp::Gt, Cell::Number(1900.0))]
    #[case("year>=1900", CompareOp::Ge, Cell::Number(1900.0))]
    #[case("year <= 1900", CompareOp::Le, Cell::Number(1900.0))]
    #[case("year < -5", CompareOp::Lt, Cell::Number(-5.0))]
    #[case("type == 'letter'", CompareOp::Eq, Cell::Text("letter".into()))]
    #[case("type != \"note\"", CompareOp::Ne, Cell::Text("note".into()))]
    #[case("place == New York", CompareOp::Eq, Cell::Text("New York".into()))]
    fn test_parse_filter(#[case] input: &str, #[case] op: CompareOp, #[case] literal: Cell) {
        let expr = parse_filter(input).unwrap();
        assert_eq!(expr.column(), input.split([' ', '>', '<', '=', '!']).next().unwrap());
        match expr {
            FilterExpr::Compare {
                op: parsed_op,
                literal: parsed_literal,
                ..
            } => {
                assert_eq!(parsed_op, op);
                assert_eq!(parsed_literal, literal);
            }
            _ => panic!("Expected comparison"),
        }
    }

    #[rstest]
    #[case("")]
    #[case("> 1900")]
    #[case("year 1900")]
    #[case("year >")]
    #[case("first name == Alice")]
    #[case("année > 1900")]
    #[case("ж == 1")]
    fn test_parse_filter_rejects_malformed(#[case] input: &str) {
        let err = parse_filter(input).unwrap_err();
        assert!(matches!(err, Error::FilterParse { .. }));
    }

    #[test]
    fn test_compare_op_display() {
        assert_eq!(CompareOp::Ge.to_string(), ">=");
        assert_eq!(CompareOp::Lt.to_string(), "<");
    }

    #[test]
    fn test_equals_filter_is_loose() {
        let expr = FilterExpr::from_spec(&FilterSpec::Match {
            column: "year".into(),
            value: serde_json::json!("1900"),
        })
        .unwrap();
        assert!(expr.matches(&Cell::Number(1900.0)));
        assert!(!expr.matches(&Cell::Missing));
    }

    #[test]
    fn test_rollup_defaults_to_count() {
        assert_eq!(Rollup::from_name(None), Rollup::Count);
        assert_eq!(Rollup::from_name(Some("sum")), Rollup::Count);
    }
}
