use async_trait::async_trait;

use crate::filter::{Filter, FilterResult};
use crate::period::Period;
use crate::types::{CohortQuery, ProjectCandidate};

/// Keeps projects whose renewal outcome is observable in the reporting
/// year: the month after the terminal month, or the one after that, falls
/// inside it. Projects without a terminal period, or not resolved by the
/// roster, never qualify.
pub struct ReportingScopeFilter;

pub fn in_reporting_scope(terminal: Option<Period>, reporting_year: i32) -> bool {
    terminal.is_some_and(|t| t.offset(1).year == reporting_year || t.offset(2).year == reporting_year)
}

#[async_trait]
impl Filter<CohortQuery, ProjectCandidate> for ReportingScopeFilter {
    async fn filter(
        &self,
        query: &CohortQuery,
        candidates: Vec<ProjectCandidate>,
    ) -> Result<FilterResult<ProjectCandidate>, String> {
        let year = query
            .reporting_year
            .ok_or_else(|| "reporting year unresolved".to_string())?;
        Ok(FilterResult::partition(candidates, |c| {
            in_reporting_scope(c.cohort_terminal(), year)
        }))
    }
}
