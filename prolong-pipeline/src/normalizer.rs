//! Wide-to-long normalization of the shipment table.
//!
//! The shipment table has one column per `<month name> <year>` pair. The
//! column → period lookup is built once per table; each row is then turned
//! into one `Observation` per month column with its token parsed.

use crate::error::{ProlongError, ProlongResult};
use crate::period::Period;
use crate::types::{Observation, ShipmentValue};
use crate::vocabulary::{canonical_token, is_stop_token, is_zeroed_token, month_number};

/// A header recognized as a month column.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthColumn {
    /// Position of the column in the source header row.
    pub position: usize,
    pub label: String,
    pub period: Period,
}

/// Lookup from header position to period, in header order.
#[derive(Clone, Debug)]
pub struct MonthColumnIndex {
    columns: Vec<MonthColumn>,
}

impl MonthColumnIndex {
    /// Match every header against the month pattern.
    ///
    /// Fails when nothing matches: an empty index would silently produce an
    /// empty dataset.
    pub fn build(headers: &[String]) -> ProlongResult<Self> {
        let columns: Vec<MonthColumn> = headers
            .iter()
            .enumerate()
            .filter_map(|(position, label)| {
                parse_month_label(label).map(|period| MonthColumn {
                    position,
                    label: label.trim().to_string(),
                    period,
                })
            })
            .collect();

        if columns.is_empty() {
            return Err(ProlongError::NoMonthColumns {
                available: headers.to_vec(),
            });
        }

        for column in &columns {
            log::debug!("month column '{}' -> {}", column.label, column.period);
        }
        log::info!("found {} month columns", columns.len());

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[MonthColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Latest year covered by any month column.
    pub fn latest_year(&self) -> Option<i32> {
        self.columns.iter().map(|c| c.period.year).max()
    }
}

/// Parse `"<month name> <year>"`, e.g. `"Январь 2023"`.
///
/// Exactly two whitespace-separated words are required and the year must
/// be all digits.
pub fn parse_month_label(label: &str) -> Option<Period> {
    let mut parts = label.split_whitespace();
    let (name, year) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Period::new(year.parse().ok()?, month_number(name)?)
}

/// Parse a single month cell.
///
/// Order matters: stop vocabulary, then zeroed-out vocabulary, then numeric
/// coercion. Anything that fails coercion is missing.
pub fn parse_token(raw: &str) -> ShipmentValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ShipmentValue::Missing;
    }

    let token = canonical_token(trimmed);
    if is_stop_token(&token) {
        return ShipmentValue::Stop;
    }
    if is_zeroed_token(&token) {
        return ShipmentValue::Amount(0.0);
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => ShipmentValue::Amount(v),
        _ => {
            log::debug!("unparseable shipment token '{}' treated as missing", trimmed);
            ShipmentValue::Missing
        }
    }
}

/// Turn one row's month cells into observations sorted by period.
///
/// `cells` is aligned with `index.columns()`; a short row yields missing
/// observations for the absent cells.
pub fn normalize_row(project_id: i64, cells: &[String], index: &MonthColumnIndex) -> Vec<Observation> {
    let mut observations: Vec<Observation> = index
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let raw = cells.get(i).map(|s| s.trim()).unwrap_or("");
            Observation {
                project_id,
                period: column.period,
                raw_token: (!raw.is_empty()).then(|| raw.to_string()),
                value: parse_token(raw),
            }
        })
        .collect();
    observations.sort_by_key(|o| o.period);
    observations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn month_labels_require_name_and_digit_year() {
        assert_eq!(parse_month_label("Январь 2023"), Period::new(2023, 1));
        assert_eq!(parse_month_label("  декабрь   2022 "), Period::new(2022, 12));
        assert_eq!(parse_month_label("Январь"), None);
        assert_eq!(parse_month_label("Январь 2023 план"), None);
        assert_eq!(parse_month_label("Январь 23г"), None);
        assert_eq!(parse_month_label("January 2023"), None);
    }

    #[test]
    fn index_skips_non_month_columns() {
        let index = MonthColumnIndex::build(&headers(&[
            "id",
            "Account",
            "Причина дубля",
            "Март 2023",
            "Январь 2023",
        ]))
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.columns()[0].position, 3);
        assert_eq!(index.columns()[0].period, Period::new(2023, 3).unwrap());
        assert_eq!(index.latest_year(), Some(2023));
    }

    #[test]
    fn index_without_month_columns_is_a_configuration_error() {
        let err = MonthColumnIndex::build(&headers(&["id", "Account"])).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, ProlongError::NoMonthColumns { ref available } if available.len() == 2));
    }

    #[test]
    fn token_parsing_follows_vocabulary_order() {
        assert_eq!(parse_token(""), ShipmentValue::Missing);
        assert_eq!(parse_token("   "), ShipmentValue::Missing);
        assert_eq!(parse_token("Стоп"), ShipmentValue::Stop);
        assert_eq!(parse_token(" END "), ShipmentValue::Stop);
        assert_eq!(parse_token("в ноль"), ShipmentValue::Amount(0.0));
        assert_eq!(parse_token("В НОЛЬ"), ShipmentValue::Amount(0.0));
        assert_eq!(parse_token("1250.5"), ShipmentValue::Amount(1250.5));
        assert_eq!(parse_token("0"), ShipmentValue::Amount(0.0));
        assert_eq!(parse_token("-30"), ShipmentValue::Amount(-30.0));
        assert_eq!(parse_token("n/a"), ShipmentValue::Missing);
        assert_eq!(parse_token("NaN"), ShipmentValue::Missing);
        assert_eq!(parse_token("inf"), ShipmentValue::Missing);
    }

    #[test]
    fn normalize_row_sorts_by_period() {
        let index = MonthColumnIndex::build(&headers(&[
            "id",
            "Февраль 2023",
            "Декабрь 2022",
            "Январь 2023",
        ]))
        .unwrap();
        let cells = vec!["50".to_string(), "стоп".to_string(), "".to_string()];
        let observations = normalize_row(7, &cells, &index);

        let periods: Vec<String> = observations.iter().map(|o| o.period.to_string()).collect();
        assert_eq!(periods, vec!["2022-12", "2023-01", "2023-02"]);
        assert!(observations[0].is_stop());
        assert_eq!(observations[1].value, ShipmentValue::Missing);
        assert_eq!(observations[1].raw_token, None);
        assert_eq!(observations[2].value, ShipmentValue::Amount(50.0));
        assert!(observations.iter().all(|o| o.project_id == 7));
    }

    #[test]
    fn short_rows_yield_missing_cells() {
        let index = MonthColumnIndex::build(&headers(&["Январь 2023", "Февраль 2023"])).unwrap();
        let observations = normalize_row(1, &["10".to_string()], &index);
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[1].value, ShipmentValue::Missing);
    }
}
