use async_trait::async_trait;

use crate::filter::{Filter, FilterResult};
use crate::types::{CohortQuery, ProjectCandidate};

/// Removes projects whose stop marker is at or before their terminal
/// period: their last "activity" is stale and would overcount renewals.
///
/// A stop after the terminal period only confirms the ending and is kept.
/// Projects without a terminal period have nothing to compare against and
/// pass; the scope filter drops them later.
pub struct StopValidityFilter;

pub fn is_stop_valid(candidate: &ProjectCandidate) -> bool {
    match (candidate.stop_marker, candidate.terminal_period) {
        (Some(stop), Some(terminal)) => stop > terminal,
        _ => true,
    }
}

#[async_trait]
impl Filter<CohortQuery, ProjectCandidate> for StopValidityFilter {
    async fn filter(
        &self,
        query: &CohortQuery,
        candidates: Vec<ProjectCandidate>,
    ) -> Result<FilterResult<ProjectCandidate>, String> {
        let result = FilterResult::partition(candidates, is_stop_valid);
        for removed in &result.removed {
            log::debug!(
                "request_id={} project {} stopped at {:?}, terminal {:?}",
                query.request_id,
                removed.project_id,
                removed.stop_marker,
                removed.terminal_period
            );
        }
        Ok(result)
    }
}
