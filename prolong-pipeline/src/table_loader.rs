//! CSV loaders for the roster and shipment tables.
//!
//! Roster columns:
//!   id, <manager column located by keyword>, month (free text, "<month name> <year>")
//! Shipment columns:
//!   id, Account, Причина дубля, one column per "<month name> <year>"
//!
//! Headers and cells are trimmed. Columns not listed above are ignored.

use std::collections::HashMap;
use std::io::Read;

use crate::error::{ProlongError, ProlongResult};
use crate::normalizer::MonthColumnIndex;
use crate::vocabulary::{
    ACCOUNT_COLUMN, DUPLICATE_REASON_COLUMN, ID_COLUMN, MANAGER_KEYWORDS, ROSTER_MONTH_COLUMN,
};

// ---------------------------------------------------------------------------
// Shipment table
// ---------------------------------------------------------------------------

/// One row of the shipment table. Month cells are kept raw; the normalizer
/// parses them.
#[derive(Debug, Clone, Default)]
pub struct ShipmentRow {
    pub project_id: i64,
    pub account: Option<String>,
    pub duplicate_reason: Option<String>,
    /// Aligned with `ShipmentTable::months.columns()`.
    pub month_cells: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ShipmentTable {
    pub months: MonthColumnIndex,
    pub rows: Vec<ShipmentRow>,
}

impl ShipmentTable {
    pub fn new(months: MonthColumnIndex, rows: Vec<ShipmentRow>) -> Self {
        Self { months, rows }
    }
}

/// Load the shipment table from a CSV reader.
pub fn load_shipments<R: Read>(reader: R) -> ProlongResult<ShipmentTable> {
    let mut csv_reader = csv_reader(reader);
    let headers = header_names(&mut csv_reader)?;

    let id_col = require_column(&headers, ID_COLUMN, "shipment")?;
    let account_col = optional_column(&headers, ACCOUNT_COLUMN, "shipment");
    let reason_col = optional_column(&headers, DUPLICATE_REASON_COLUMN, "shipment");
    let months = MonthColumnIndex::build(&headers)?;

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result?;
        let raw_id = record.get(id_col).unwrap_or("");
        let Some(project_id) = parse_project_id(raw_id) else {
            log::warn!(
                "shipment line {}: unparseable id '{}', row skipped",
                line_num + 2,
                raw_id
            );
            continue;
        };
        rows.push(ShipmentRow {
            project_id,
            account: account_col.and_then(|c| non_empty(record.get(c))),
            duplicate_reason: reason_col.and_then(|c| non_empty(record.get(c))),
            month_cells: months
                .columns()
                .iter()
                .map(|c| record.get(c.position).unwrap_or("").to_string())
                .collect(),
        });
    }

    log::info!("loaded {} shipment rows", rows.len());
    Ok(ShipmentTable::new(months, rows))
}

/// Load the shipment table from a CSV file path.
pub fn load_shipments_file(path: &str) -> ProlongResult<ShipmentTable> {
    load_shipments(open(path)?)
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterEntry {
    pub project_id: i64,
    pub manager: Option<String>,
    /// Free-text scheduled renewal month, e.g. "Март 2023".
    pub scheduled_month: Option<String>,
}

/// Roster entries keyed by project id.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub manager_column: String,
    entries: HashMap<i64, RosterEntry>,
}

impl Roster {
    /// Build from entries; the first entry per project id wins.
    pub fn from_entries(manager_column: impl Into<String>, entries: Vec<RosterEntry>) -> Self {
        let mut by_id: HashMap<i64, RosterEntry> = HashMap::with_capacity(entries.len());
        for entry in entries {
            if by_id.contains_key(&entry.project_id) {
                log::warn!("roster: duplicate id {}, keeping the first row", entry.project_id);
                continue;
            }
            by_id.insert(entry.project_id, entry);
        }
        Self {
            manager_column: manager_column.into(),
            entries: by_id,
        }
    }

    pub fn get(&self, project_id: i64) -> Option<&RosterEntry> {
        self.entries.get(&project_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load the roster from a CSV reader.
pub fn load_roster<R: Read>(reader: R) -> ProlongResult<Roster> {
    let mut csv_reader = csv_reader(reader);
    let headers = header_names(&mut csv_reader)?;

    let id_col = require_column(&headers, ID_COLUMN, "roster")?;
    let manager_col = detect_manager_column(&headers)?;
    let month_col = require_column(&headers, ROSTER_MONTH_COLUMN, "roster")?;
    log::info!("roster manager column: '{}'", headers[manager_col]);

    let mut entries = Vec::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let record = result?;
        let Some(project_id) = parse_project_id(record.get(id_col).unwrap_or("")) else {
            log::warn!("roster line {}: unparseable id, row skipped", line_num + 2);
            continue;
        };
        entries.push(RosterEntry {
            project_id,
            manager: non_empty(record.get(manager_col)),
            scheduled_month: non_empty(record.get(month_col)),
        });
    }

    Ok(Roster::from_entries(headers[manager_col].clone(), entries))
}

/// Load the roster from a CSV file path.
pub fn load_roster_file(path: &str) -> ProlongResult<Roster> {
    load_roster(open(path)?)
}

/// Locate the account-manager column by ranked keyword match.
///
/// A column whose whole name is a keyword beats one containing the keyword
/// as a word, which beats a plain substring match. Ties go to the keyword
/// listed first, then to the leftmost column. The id column never matches.
pub fn detect_manager_column(headers: &[String]) -> ProlongResult<usize> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(i, name)| manager_column_rank(name).map(|rank| (rank, i)))
        .min()
        .map(|(_, i)| i)
        .ok_or_else(|| ProlongError::ColumnNotFound {
            table: "roster",
            expected: format!("account manager column (one of {:?})", MANAGER_KEYWORDS),
            available: headers.to_vec(),
        })
}

/// (match tier, keyword priority); lower is better.
fn manager_column_rank(name: &str) -> Option<(u8, usize)> {
    let lower = name.trim().to_lowercase();
    if lower == ID_COLUMN {
        return None;
    }
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    MANAGER_KEYWORDS
        .iter()
        .enumerate()
        .filter_map(|(priority, keyword)| {
            let tier = if lower == *keyword {
                0
            } else if words.contains(keyword) {
                1
            } else if lower.contains(keyword) {
                2
            } else {
                return None;
            };
            Some((tier, priority))
        })
        .min()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn header_names<R: Read>(reader: &mut csv::Reader<R>) -> ProlongResult<Vec<String>> {
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect())
}

fn open(path: &str) -> ProlongResult<std::fs::File> {
    std::fs::File::open(path).map_err(|source| ProlongError::Io {
        path: path.to_string(),
        source,
    })
}

fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn require_column(headers: &[String], name: &str, table: &'static str) -> ProlongResult<usize> {
    find_column(headers, name).ok_or_else(|| ProlongError::ColumnNotFound {
        table,
        expected: format!("'{}'", name),
        available: headers.to_vec(),
    })
}

fn optional_column(headers: &[String], name: &str, table: &str) -> Option<usize> {
    let found = find_column(headers, name);
    if found.is_none() {
        log::warn!("{} table has no '{}' column", table, name);
    }
    found
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Integer ids, also accepting integral floats such as "12.0".
fn parse_project_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPMENTS_CSV: &str = "\
id,Account,Причина дубля,Январь 2023,Февраль 2023,Март 2023,Комментарий
1,Петров,,100,50,стоп,
2,Сидорова,дубль по договору,200,в ноль,300,проверить
2,Сидорова,,10,,,
x,Никто,,1,1,1,
3.0,,,,,,
";

    const ROSTER_CSV: &str = "\
id,Название проекта,АМ,month
1,Альфа,Иванов,Февраль 2023
2,Бета,,Март 2023
2,Бета-дубль,Козлов,Март 2023
4,Гамма,Орлова,когда-нибудь
";

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn load_sample_shipments() {
        let table = load_shipments(SHIPMENTS_CSV.as_bytes()).unwrap();
        assert_eq!(table.months.len(), 3);
        // "x" row is dropped, "3.0" parses as 3
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0].project_id, 1);
        assert_eq!(table.rows[0].account.as_deref(), Some("Петров"));
        assert_eq!(table.rows[0].duplicate_reason, None);
        assert_eq!(table.rows[0].month_cells, vec!["100", "50", "стоп"]);
        assert_eq!(table.rows[1].duplicate_reason.as_deref(), Some("дубль по договору"));
        assert_eq!(table.rows[3].project_id, 3);
        assert_eq!(table.rows[3].account, None);
    }

    #[test]
    fn shipments_without_month_columns_fail() {
        let err = load_shipments("id,Account\n1,Петров\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ProlongError::NoMonthColumns { .. }));
    }

    #[test]
    fn shipments_without_id_fail() {
        let err = load_shipments("Account,Январь 2023\nПетров,1\n".as_bytes()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn load_sample_roster() {
        let roster = load_roster(ROSTER_CSV.as_bytes()).unwrap();
        assert_eq!(roster.manager_column, "АМ");
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.get(1).unwrap().manager.as_deref(), Some("Иванов"));
        // first row for id 2 wins even though its manager is empty
        assert_eq!(roster.get(2).unwrap().manager, None);
        assert_eq!(roster.get(4).unwrap().scheduled_month.as_deref(), Some("когда-нибудь"));
        assert!(roster.get(3).is_none());
    }

    #[test]
    fn roster_without_month_column_fails() {
        let err = load_roster("id,АМ\n1,Иванов\n".as_bytes()).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, ProlongError::ColumnNotFound { table: "roster", .. }));
    }

    #[test]
    fn manager_column_prefers_exact_then_word_then_substring() {
        let h = headers(&["id", "Project name", "Account manager", "АМ"]);
        assert_eq!(detect_manager_column(&h).unwrap(), 3);

        let h = headers(&["id", "Project name", "Account manager"]);
        assert_eq!(detect_manager_column(&h).unwrap(), 2);

        let h = headers(&["id", "Менеджер проекта", "Account manager"]);
        assert_eq!(detect_manager_column(&h).unwrap(), 1);

        let h = headers(&["id", "Project name"]);
        assert_eq!(detect_manager_column(&h).unwrap(), 1);
    }

    #[test]
    fn missing_manager_column_lists_candidates() {
        let h = headers(&["id", "Проект", "month"]);
        match detect_manager_column(&h).unwrap_err() {
            ProlongError::ColumnNotFound { table, available, .. } => {
                assert_eq!(table, "roster");
                assert_eq!(available, h);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn project_ids_accept_integral_floats_only() {
        assert_eq!(parse_project_id("42"), Some(42));
        assert_eq!(parse_project_id(" 42.0 "), Some(42));
        assert_eq!(parse_project_id("42.5"), None);
        assert_eq!(parse_project_id(""), None);
        assert_eq!(parse_project_id("abc"), None);
    }
}
