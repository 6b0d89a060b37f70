use async_trait::async_trait;
use std::sync::Arc;

use crate::side_effect::{SideEffect, SideEffectInput};
use crate::types::{CohortQuery, ProjectCandidate};

/// Logs a one-line summary of the run once selection is final.
pub struct RunSummarySideEffect;

#[async_trait]
impl SideEffect<CohortQuery, ProjectCandidate> for RunSummarySideEffect {
    async fn run(
        &self,
        input: Arc<SideEffectInput<CohortQuery, ProjectCandidate>>,
    ) -> Result<(), String> {
        let base: f64 = input
            .selected_candidates
            .iter()
            .filter_map(|c| c.shipment)
            .map(|s| s.ship_last)
            .sum();
        log::info!(
            "request_id={} reporting_year={:?} projects_in_scope={} removed={} base_shipment={:.0}",
            input.query.request_id,
            input.query.reporting_year,
            input.selected_candidates.len(),
            input.removed_count,
            base
        );
        Ok(())
    }
}
