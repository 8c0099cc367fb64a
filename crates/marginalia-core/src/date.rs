//! Fuzzy historical date parsing
//!
//! Archival datasets record dates as "c. 1850", "1850?", "Winter 1914",
//! "1850-06" or plain years next to proper ISO dates. [`parse_fuzzy_date`]
//! resolves all of these to a calendar date plus an `approximate` flag and
//! never fails: anything it cannot read comes back with `date: None`.
//!
//! Resolution order, most specific first:
//!
//! 1. empty input
//! 2. approximation markers (`c.`, `circa`, trailing `?`, leading `~`, `[...]`)
//! 3. `<season|month> YYYY`
//! 4. full calendar dates (only for inputs longer than 4 characters)
//! 5. `YYYY-M` / `YYYY-MM`
//! 6. bare `YYYY` (July 1st, always approximate)

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::table::Cell;

static CIRCA_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^c\.\s*").expect("valid regex"));
static CIRCA_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^circa\s+").expect("valid regex"));
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*\]$").expect("valid regex"));
static WORD_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s+([0-9]{4})$").expect("valid regex"));
static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})$").expect("valid regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{4})$").expect("valid regex"));

/// Date-only formats tried by the generic stage
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y",
    "%B %d %Y", "%b %d %Y",
];

/// Date-time formats tried by the generic stage
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Outcome of parsing one date string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParseResult {
    /// Resolved calendar date, `None` when unparseable
    pub date: Option<NaiveDate>,
    /// Whether the date is coarser than a specific day or marked uncertain
    pub approximate: bool,
    /// The trimmed input
    pub original: String,
}

impl DateParseResult {
    fn unresolved(approximate: bool, original: String) -> Self {
        Self {
            date: None,
            approximate,
            original,
        }
    }

    /// Milliseconds since the Unix epoch at UTC midnight of the date
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    }

    /// 0-based month index of the resolved date
    pub fn month0(&self) -> Option<u32> {
        self.date.map(|d| d.month0())
    }

    /// Year of the resolved date
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }
}

/// A parse result tagged with its position in a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDate {
    /// Row index
    pub index: usize,
    /// The parse result for that row
    #[serde(flatten)]
    pub result: DateParseResult,
}

fn season_month0(word: &str) -> Option<u32> {
    match word {
        "spring" => Some(3),
        "summer" => Some(6),
        "autumn" | "fall" => Some(9),
        "winter" => Some(0),
        _ => None,
    }
}

fn month0(word: &str) -> Option<u32> {
    let m = match word {
        "jan" | "january" => 0,
        "feb" | "february" => 1,
        "mar" | "march" => 2,
        "apr" | "april" => 3,
        "may" => 4,
        "jun" | "june" => 5,
        "jul" | "july" => 6,
        "aug" | "august" => 7,
        "sep" | "sept" | "september" => 8,
        "oct" | "october" => 9,
        "nov" | "november" => 10,
        "dec" | "december" => 11,
        _ => return None,
    };
    Some(m)
}

fn first_of_month(year: i32, month0: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

/// Remove approximation markers. Returns the cleaned text and whether any matched.
fn strip_markers(raw: &str) -> (String, bool) {
    let marked = CIRCA_PREFIX.is_match(raw)
        || CIRCA_WORD.is_match(raw)
        || raw.ends_with('?')
        || raw.starts_with('~')
        || BRACKETED.is_match(raw);
    if !marked {
        return (raw.to_string(), false);
    }

    let without_c = CIRCA_PREFIX.replace(raw, "");
    let without_circa = CIRCA_WORD.replace(without_c.as_ref(), "");
    let s: &str = without_circa.as_ref();
    let s = s.strip_suffix('?').unwrap_or(s);
    let s = s.strip_prefix('~').unwrap_or(s);
    let s = s.strip_prefix('[').unwrap_or(s);
    let s = s.strip_suffix(']').unwrap_or(s);
    (s.trim().to_string(), true)
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a fuzzy date string. `None` input is treated like an absent value.
pub fn parse_fuzzy_date(input: Option<&str>) -> DateParseResult {
    let Some(input) = input else {
        return DateParseResult::unresolved(false, "null".to_string());
    };

    let raw = input.trim();
    if raw.is_empty() {
        return DateParseResult::unresolved(false, String::new());
    }
    let original = raw.to_string();

    let (cleaned, mut approximate) = strip_markers(raw);

    // Season/month names first so the generic parser never sees them
    if let Some(caps) = WORD_YEAR.captures(&cleaned) {
        let word = caps[1].to_lowercase();
        let Ok(year) = caps[2].parse::<i32>() else {
            return DateParseResult::unresolved(approximate, original);
        };
        if let Some(m) = season_month0(&word) {
            return DateParseResult {
                date: first_of_month(year, m),
                approximate: true,
                original,
            };
        }
        if let Some(m) = month0(&word) {
            return DateParseResult {
                date: first_of_month(year, m),
                approximate,
                original,
            };
        }
    }

    // Bare years are left to the year stage below
    if cleaned.chars().count() > 4 {
        if let Some(date) = parse_calendar_date(&cleaned) {
            return DateParseResult {
                date: Some(date),
                approximate,
                original,
            };
        }
    }

    if let Some(caps) = YEAR_MONTH.captures(&cleaned) {
        let date = match (caps[1].parse::<i32>(), caps[2].parse::<u32>()) {
            (Ok(year), Ok(month)) => month
                .checked_sub(1)
                .and_then(|m0| first_of_month(year, m0)),
            _ => None,
        };
        if date.is_some() {
            return DateParseResult {
                date,
                approximate,
                original,
            };
        }
        return DateParseResult::unresolved(approximate, original);
    }

    if let Some(caps) = YEAR.captures(&cleaned) {
        approximate = true;
        return DateParseResult {
            date: caps[1]
                .parse::<i32>()
                .ok()
                .and_then(|year| NaiveDate::from_ymd_opt(year, 7, 1)),
            approximate,
            original,
        };
    }

    DateParseResult::unresolved(approximate, original)
}

/// Parse a table cell. Numbers are read through their display form.
pub fn parse_cell(cell: &Cell) -> DateParseResult {
    match cell {
        Cell::Missing => parse_fuzzy_date(None),
        Cell::Text(s) => parse_fuzzy_date(Some(s.as_str())),
        number => parse_fuzzy_date(Some(number.to_string().as_str())),
    }
}

/// Parse every value of a column, keeping row indices.
pub fn parse_date_column<'a>(values: impl IntoIterator<Item = &'a Cell>) -> Vec<IndexedDate> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, cell)| IndexedDate {
            index,
            result: parse_cell(cell),
        })
        .collect()
}
