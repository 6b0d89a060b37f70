use async_trait::async_trait;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::normalizer::normalize_row;
use crate::source::Source;
use crate::table_loader::ShipmentTable;
use crate::types::{CohortQuery, Observation, ProjectCandidate};

/// Source that normalizes the wide shipment table into one candidate per
/// project id.
///
/// Rows are normalized in parallel. Rows sharing a project id (duplicates)
/// are merged: their observations are concatenated, the first non-empty
/// account label is kept and duplicate reasons are joined.
pub struct ShipmentSource {
    table: Arc<ShipmentTable>,
}

impl ShipmentSource {
    pub fn new(table: Arc<ShipmentTable>) -> Self {
        Self { table }
    }

    /// Normalize every row and merge by project id, ordered by id.
    pub fn normalize(&self) -> Vec<ProjectCandidate> {
        let months = &self.table.months;
        let normalized: Vec<Vec<Observation>> = self
            .table
            .rows
            .par_iter()
            .map(|row| normalize_row(row.project_id, &row.month_cells, months))
            .collect();

        let mut projects: BTreeMap<i64, ProjectCandidate> = BTreeMap::new();
        for (row, observations) in self.table.rows.iter().zip(normalized) {
            let project = projects
                .entry(row.project_id)
                .or_insert_with(|| ProjectCandidate {
                    project_id: row.project_id,
                    ..ProjectCandidate::default()
                });
            if project.account.is_none() {
                project.account = row.account.clone();
            }
            if let Some(reason) = &row.duplicate_reason {
                project.duplicate_reason = Some(match project.duplicate_reason.take() {
                    Some(existing) => format!("{}; {}", existing, reason),
                    None => reason.clone(),
                });
            }
            project.observations.extend(observations);
        }

        projects
            .into_values()
            .map(|mut project| {
                // stable: same-period observations keep row order
                project.observations.sort_by_key(|o| o.period);
                project
            })
            .collect()
    }
}

#[async_trait]
impl Source<CohortQuery, ProjectCandidate> for ShipmentSource {
    fn enable(&self, _query: &CohortQuery) -> bool {
        !self.table.rows.is_empty()
    }

    async fn get_candidates(&self, _query: &CohortQuery) -> Result<Vec<ProjectCandidate>, String> {
        Ok(self.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_loader::load_shipments;
    use crate::types::ShipmentValue;

    const CSV: &str = "\
id,Account,Причина дубля,Февраль 2023,Январь 2023
5,Петров,,50,100
2,,дубль,в ноль,200
2,Сидорова,повтор,10,
";

    fn source() -> ShipmentSource {
        ShipmentSource::new(Arc::new(load_shipments(CSV.as_bytes()).unwrap()))
    }

    #[tokio::test]
    async fn one_candidate_per_project_ordered_by_id() {
        let query = CohortQuery::new("t", Some(2023));
        let candidates = source().get_candidates(&query).await.unwrap();
        let ids: Vec<i64> = candidates.iter().map(|c| c.project_id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn duplicate_rows_are_merged() {
        let candidates = source().normalize();
        let dup = &candidates[0];
        assert_eq!(dup.observations.len(), 4);
        assert_eq!(dup.account.as_deref(), Some("Сидорова"));
        assert_eq!(dup.duplicate_reason.as_deref(), Some("дубль; повтор"));

        let periods: Vec<String> = dup.observations.iter().map(|o| o.period.to_string()).collect();
        assert_eq!(periods, vec!["2023-01", "2023-01", "2023-02", "2023-02"]);
        assert_eq!(dup.observations[2].value, ShipmentValue::Amount(0.0));
        assert_eq!(dup.observations[3].value, ShipmentValue::Amount(10.0));
    }

    #[test]
    fn observations_are_sorted_by_period() {
        let candidates = source().normalize();
        let single = &candidates[1];
        assert_eq!(single.observations[0].value, ShipmentValue::Amount(100.0));
        assert_eq!(single.observations[1].value, ShipmentValue::Amount(50.0));
    }

    #[test]
    fn disabled_for_empty_table() {
        let table = load_shipments("id,Январь 2023\n".as_bytes()).unwrap();
        let source = ShipmentSource::new(Arc::new(table));
        assert!(!source.enable(&CohortQuery::new("t", None)));
    }
}
