use async_trait::async_trait;

use crate::query_hydrator::QueryHydrator;
use crate::table_loader::ShipmentTable;
use crate::types::CohortQuery;

/// Fills in the reporting year when the caller left it open.
///
/// The default is the latest year covered by the shipment table's month
/// columns.
pub struct ReportingYearQueryHydrator {
    pub default_year: Option<i32>,
}

impl ReportingYearQueryHydrator {
    pub fn new(default_year: Option<i32>) -> Self {
        Self { default_year }
    }

    pub fn from_table(table: &ShipmentTable) -> Self {
        Self::new(table.months.latest_year())
    }
}

#[async_trait]
impl QueryHydrator<CohortQuery> for ReportingYearQueryHydrator {
    fn enable(&self, query: &CohortQuery) -> bool {
        query.reporting_year.is_none()
    }

    async fn hydrate(&self, query: &CohortQuery) -> Result<CohortQuery, String> {
        let year = self
            .default_year
            .ok_or_else(|| "no reporting year given and none derivable from the data".to_string())?;
        log::info!("request_id={} defaulting reporting year to {}", query.request_id, year);
        Ok(CohortQuery {
            reporting_year: Some(year),
            ..query.clone()
        })
    }

    fn update(&self, query: &mut CohortQuery, hydrated: CohortQuery) {
        query.reporting_year = hydrated.reporting_year;
    }
}
