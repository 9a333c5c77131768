//! Contaminant tables from arbitrary product markup.
//!
//! Two sources, in this order:
//!
//! - `<table>` elements whose leading cells mention a contaminant keyword
//! - small inline JSON objects mentioning `contaminant` with a `name` key
//!
//! Every row is classified with [`classify_status`](super::classify::classify_status),
//! including inline JSON rows that carry their own `status`.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{ParseError, ParseResult};
use crate::types::contaminant::{ContaminantRecord, NOT_DETECTED};

/// Keywords that mark a table as a contaminant table.
const TABLE_KEYWORDS: &[&str] = &[
    "contaminant",
    "detected",
    "limit",
    "ppb",
    "ppm",
    "ppt",
    "arsenic",
    "lead",
    "pfas",
];

/// Number of leading cells that form a table's signature.
const SIGNATURE_CELLS: usize = 6;

/// Minimum cells in a data row.
const MIN_ROW_CELLS: usize = 3;

static UNIT_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9]+(?:\.[0-9]+)?\s*(?:ppb|ppm|ppt|mg|µg|μg|ug|particles)")
        .expect("unit numeral pattern is valid")
});

static INLINE_CONTAMINANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{[^{}]*contaminant[^{}]*\}").expect("inline contaminant pattern is valid")
});

/// Column positions named by a table's header row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct HeaderColumns {
    detected: Option<usize>,
    legal: Option<usize>,
    health: Option<usize>,
}

impl HeaderColumns {
    fn from_header(cells: &[String]) -> Self {
        let lowered: Vec<String> = cells.iter().map(|c| c.to_lowercase()).collect();

        let health = find_column(&lowered, &["health", "guideline", "phg"], &[]);
        let legal = find_column(&lowered, &["legal", "limit", "mcl"], &[health]);
        let detected = find_column(&lowered, &["detected", "level", "amount", "result"], &[health, legal]);

        Self {
            detected,
            legal,
            health,
        }
    }
}

/// First non-name column whose header mentions a keyword and is not taken.
fn find_column(header: &[String], keywords: &[&str], taken: &[Option<usize>]) -> Option<usize> {
    header.iter().enumerate().skip(1).find_map(|(i, cell)| {
        (!taken.contains(&Some(i)) && keywords.iter().any(|k| cell.contains(k))).then_some(i)
    })
}

/// Pulls contaminant rows out of a parsed page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContaminantTableExtractor;

impl ContaminantTableExtractor {
    pub fn new() -> Self {
        Self
    }

    /// All rows found in `document` and `raw`, table rows first.
    ///
    /// A failure in one source is logged and the other source still runs.
    pub fn extract(&self, document: &Html, raw: &str) -> Vec<ContaminantRecord> {
        let mut rows = match self.from_tables(document) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Contaminant table scan failed");
                Vec::new()
            }
        };
        rows.extend(self.from_inline_json(raw));
        rows
    }

    /// Rows from every table whose signature passes the keyword check.
    pub fn from_tables(&self, document: &Html) -> ParseResult<Vec<ContaminantRecord>> {
        let table_selector = selector("table")?;
        let row_selector = selector("tr")?;

        let mut records = Vec::new();

        for table in document.select(&table_selector) {
            // Rows and cells of nested tables belong to those tables.
            let rows: Vec<Vec<String>> = table
                .select(&row_selector)
                .filter(|row| nearest_table(row) == Some(table))
                .map(|row| own_cells(&row))
                .collect();

            let signature = rows
                .iter()
                .flatten()
                .take(SIGNATURE_CELLS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();

            if !TABLE_KEYWORDS.iter().any(|k| signature.contains(k)) {
                debug!(signature = %signature, "Skipping non-contaminant table");
                continue;
            }

            let mut rows = rows.into_iter();
            let columns = rows
                .next()
                .map(|header| HeaderColumns::from_header(&header))
                .unwrap_or_default();

            records.extend(rows.filter_map(|cells| row_to_record(&cells, columns)));
        }

        Ok(records)
    }

    /// Rows from inline JSON fragments; the supplied status is ignored.
    pub fn from_inline_json(&self, raw: &str) -> Vec<ContaminantRecord> {
        INLINE_CONTAMINANT
            .find_iter(raw)
            .filter_map(|candidate| {
                match serde_json::from_str::<Map<String, Value>>(candidate.as_str()) {
                    Ok(object) => inline_to_record(&object),
                    Err(e) => {
                        debug!(error = %e, "Skipping unparseable inline contaminant");
                        None
                    }
                }
            })
            .collect()
    }
}

fn selector(css: &str) -> ParseResult<Selector> {
    Selector::parse(css).map_err(|_| ParseError::Selector {
        selector: css.to_string(),
    })
}

fn nearest_table<'a>(row: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

/// Text of the `th`/`td` cells directly under `row`.
fn own_cells(row: &ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .map(|cell| cell_text(&cell))
        .collect()
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accepted contaminant names are longer than two characters.
fn acceptable_name(name: &str) -> bool {
    name.trim().chars().count() > 2
}

fn is_not_detected(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    lowered == "nd" || lowered.contains("not detected") || lowered.contains("non-detect")
}

/// Normalize a measurement cell: not-detected spellings collapse to `ND`.
fn measurement(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else if is_not_detected(text) {
        Some(NOT_DETECTED.to_string())
    } else {
        Some(text.to_string())
    }
}

fn row_to_record(cells: &[String], columns: HeaderColumns) -> Option<ContaminantRecord> {
    if cells.len() < MIN_ROW_CELLS {
        return None;
    }

    let name = cells[0].trim();
    if !acceptable_name(name) {
        return None;
    }

    let values = &cells[1..];
    let column = |index: Option<usize>| index.and_then(|i| cells.get(i)).and_then(|c| measurement(c));
    let scan = |pred: &dyn Fn(&str) -> bool| values.iter().find(|c| pred(c)).and_then(|c| measurement(c));

    let detected = column(columns.detected)
        .or_else(|| scan(&|c: &str| UNIT_NUMERAL.is_match(c) || is_not_detected(c)));
    let legal_limit = column(columns.legal).or_else(|| {
        scan(&|c: &str| {
            let c = c.to_lowercase();
            c.contains("limit") || c.contains("legal")
        })
    });
    let health_guideline = column(columns.health).or_else(|| {
        scan(&|c: &str| {
            let c = c.to_lowercase();
            c.contains("health") || c.contains("guideline")
        })
    });

    Some(ContaminantRecord::classified(
        name,
        detected,
        legal_limit,
        health_guideline,
    ))
}

fn inline_to_record(object: &Map<String, Value>) -> Option<ContaminantRecord> {
    let name = object.get("name")?.as_str()?.trim();
    if !acceptable_name(name) {
        return None;
    }

    let field = |key: &str| match object.get(key) {
        Some(Value::String(s)) => measurement(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Some(ContaminantRecord::classified(
        name,
        field("detected"),
        field("legal_limit"),
        field("health_guideline"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::contaminant::Status;

    fn extract(html: &str) -> Vec<ContaminantRecord> {
        ContaminantTableExtractor::new().extract(&Html::parse_document(html), html)
    }

    #[test]
    fn test_cell_scan_table() {
        let html = r#"<table>
            <tr><th>Contaminant</th><th>Amount</th><th>Notes</th><th>Advice</th></tr>
            <tr><td>Lead</td><td>12 ppb</td><td>Legal limit 10 ppb</td><td>Health guideline 1 ppb</td></tr>
            <tr><td>Arsenic</td><td>0.5 ppb</td><td>Legal limit 10 ppb</td><td>Health guideline 1 ppb</td></tr>
            <tr><td>Fluoride</td><td>ND</td><td>Legal limit 4 ppm</td></tr>
        </table>"#;
        let rows = extract(html);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].status(), Status::Fail);
        assert_eq!(rows[1].status(), Status::Pass);
        assert_eq!(rows[2].detected.as_deref(), Some("ND"));
        assert_eq!(rows[2].status(), Status::Unknown);
    }

    #[test]
    fn test_header_columns_win() {
        let html = r#"<table>
            <tr><th>Substance</th><th>Detected</th><th>Legal Limit</th><th>Health Guideline</th></tr>
            <tr><td>Nitrate</td><td>5 ppb</td><td>10 ppb</td><td>1 ppb</td></tr>
            <tr><td>Chromium</td><td>not detected</td><td>100 ppb</td><td>0.02 ppb</td></tr>
        </table>"#;
        let rows = extract(html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].legal_limit.as_deref(), Some("10 ppb"));
        assert_eq!(rows[0].health_guideline.as_deref(), Some("1 ppb"));
        assert_eq!(rows[0].status(), Status::Warning);
        assert!(rows[1].is_not_detected());
    }

    #[test]
    fn test_nested_table_rows_counted_once() {
        let html = r#"<table><tr><td>
            <table>
              <tr><th>Contaminant</th><th>Detected</th><th>Legal Limit</th></tr>
              <tr><td>Lead</td><td>12 ppb</td><td>10 ppb</td></tr>
            </table>
        </td></tr></table>"#;
        let names: Vec<_> = extract(html).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Lead"]);
    }

    #[test]
    fn test_rejects_tables_without_keywords() {
        let html = r#"<table>
            <tr><th>Size</th><th>Price</th><th>Stock</th></tr>
            <tr><td>500 ml</td><td>$2</td><td>12 units</td></tr>
        </table>"#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_short_rows_and_names_rejected() {
        let html = r#"<table>
            <tr><th>Contaminant</th><th>Detected</th><th>Limit</th></tr>
            <tr><td>Pb</td><td>3 ppb</td><td>10 ppb</td></tr>
            <tr><td>Copper</td><td>3 ppb</td></tr>
        </table>"#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_inline_json_rederives_status() {
        let raw = r#"<script>window.x = {"kind":"contaminant","name":"Lead","detected":"12 ppb","legal_limit":"10 ppb","status":"pass"};</script>"#;
        let rows = extract(raw);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status(), Status::Fail);
    }

    #[test]
    fn test_tables_before_inline_json() {
        let html = r#"<table>
            <tr><th>Contaminant</th><th>Detected</th><th>Limit</th></tr>
            <tr><td>Lead</td><td>1 ppb</td><td>10 ppb</td></tr>
        </table>
        <script>{"contaminant":true,"name":"Arsenic","detected":"2 ppb"}</script>"#;
        let names: Vec<_> = extract(html).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Lead", "Arsenic"]);
    }
}
