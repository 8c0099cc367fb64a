//! Author-facing diagnostics
//!
//! Combines configuration errors, the data health report, column-role
//! mappings and view names into one list of leveled messages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::NarrativeConfig;
use crate::loader::health_report;
use crate::table::Table;

/// Views the rendering layer knows how to draw
pub const KNOWN_VIEWS: &[&str] = &["timeline", "network", "search", "text", "gallery", "image"];

/// Maximum edit distance for a "did you mean" suggestion
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Something is broken
    Error,
    /// Something looks wrong
    Warning,
    /// For information
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        })
    }
}

/// One diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
}

impl Diagnostic {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Build the diagnostics list for a loaded essay.
pub fn diagnose(
    config_errors: &[String],
    table: Option<&Table>,
    config: Option<&NarrativeConfig>,
) -> Vec<Diagnostic> {
    let mut out: Vec<Diagnostic> = config_errors
        .iter()
        .map(|e| Diagnostic::new(Level::Error, e.clone()))
        .collect();

    if let Some(table) = table {
        let report = health_report(table);
        out.push(Diagnostic::new(
            Level::Info,
            format!(
                "Found {} rows, {} columns.",
                report.row_count,
                report.columns.len()
            ),
        ));

        for column in &report.columns {
            let count = report.missing_in(column);
            if count == 0 {
                continue;
            }
            let pct = (count as f64 / report.row_count as f64 * 100.0).round() as u64;
            let level = if pct > 50 { Level::Warning } else { Level::Info };
            out.push(Diagnostic::new(
                level,
                format!("Column \"{column}\": {count} missing values ({pct}%)."),
            ));
        }

        if let Some(config) = config {
            let mut roles: Vec<(&String, &String)> = config.data.columns.iter().collect();
            roles.sort();
            for (role, column) in roles {
                if !report.columns.contains(column) {
                    out.push(Diagnostic::new(
                        Level::Error,
                        format!(
                            "Config maps \"{role}\" to column \"{column}\", but it doesn't exist in the CSV."
                        ),
                    ));
                }
            }
        }
    }

    if let Some(config) = config {
        for view in config.story.iter().filter_map(|s| s.view.as_deref()) {
            if KNOWN_VIEWS.contains(&view) {
                continue;
            }
            let hint = closest_view(view)
                .map(|s| format!(" Did you mean \"{s}\"?"))
                .unwrap_or_default();
            out.push(Diagnostic::new(
                Level::Error,
                format!("Unknown view type \"{view}\".{hint}"),
            ));
        }
    }

    out
}

/// Closest known view name within the suggestion distance
pub fn closest_view(input: &str) -> Option<&'static str> {
    let input = input.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for &view in KNOWN_VIEWS {
        let dist = levenshtein(&input, view);
        if dist <= MAX_SUGGESTION_DISTANCE && best.is_none_or(|(_, d)| dist < d) {
            best = Some((view, dist));
        }
    }
    best.map(|(view, _)| view)
}

/// Edit distance between two strings (by characters)
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_csv;

    fn config(yaml: &str) -> NarrativeConfig {
        NarrativeConfig::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_closest_view() {
        assert_eq!(closest_view("timline"), Some("timeline"));
        assert_eq!(closest_view("Netwrk"), Some("network"));
        assert_eq!(closest_view("spreadsheet"), None);
    }

    #[test]
    fn test_config_errors_come_first() {
        let out = diagnose(&["Missing \"story\"".to_string()], None, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].level, Level::Error);
    }

    #[test]
    fn test_health_messages() {
        let table = parse_csv("a,b\n1,\n2,\n3,x\n").table;
        let out = diagnose(&[], Some(&table), None);
        assert_eq!(out[0].message, "Found 3 rows, 2 columns.");
        assert_eq!(out[1].level, Level::Warning);
        assert_eq!(out[1].message, "Column \"b\": 2 missing values (67%).");
    }

    #[test]
    fn test_low_missing_share_is_info() {
        let table = parse_csv("a\n1\n\n2\n3\n,\n").table;
        let out = diagnose(&[], Some(&table), None);
        assert!(out.iter().all(|d| d.level == Level::Info));
    }

    #[test]
    fn test_mapped_column_absent() {
        let table = parse_csv("sender,recipient\nA,B\n").table;
        let cfg = config(
            "metadata: {title: T}\ndata: {csv: x.csv, columns: {source: sender, target: to}}\nstory: []\n",
        );
        let out = diagnose(&[], Some(&table), Some(&cfg));
        let errors: Vec<_> = out.iter().filter(|d| d.level == Level::Error).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("\"target\" to column \"to\""));
    }

    #[test]
    fn test_unknown_view_with_suggestion() {
        let cfg = config(
            "metadata: {title: T}\ndata: {csv: x.csv}\nstory:\n  - view: timline\n  - view: spreadsheet\n  - view: text\n",
        );
        let out = diagnose(&[], None, Some(&cfg));
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].to_string(),
            "[ERROR] Unknown view type \"timline\". Did you mean \"timeline\"?"
        );
        assert_eq!(out[1].message, "Unknown view type \"spreadsheet\".");
    }
}
