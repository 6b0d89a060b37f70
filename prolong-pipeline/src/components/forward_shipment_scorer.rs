use async_trait::async_trait;
use rayon::prelude::*;

use crate::scorer::Scorer;
use crate::types::{CohortQuery, ForwardShipment, ProjectCandidate};

/// Measures shipment at the terminal month and one and two months after it.
///
/// Pure per-project function, evaluated in parallel.
pub struct ForwardShipmentScorer;

/// Forward shipment for one project.
///
/// When every observation at the terminal month is exactly zero, the base
/// is taken from the month before (an absent month sums to 0). Absent or
/// non-numeric forward months sum to 0. Projects without a terminal period
/// get all zeros.
pub fn forward_shipment(candidate: &ProjectCandidate) -> ForwardShipment {
    let Some(terminal) = candidate.terminal_period else {
        return ForwardShipment::default();
    };

    let mut terminal_set = candidate.observations_at(terminal).peekable();
    let zeroed_out = terminal_set.peek().is_some() && terminal_set.all(|o| o.value.is_zero());

    let ship_last = if zeroed_out {
        candidate.shipment_at(terminal.prev())
    } else {
        candidate.shipment_at(terminal)
    };

    ForwardShipment {
        ship_last,
        ship_m1: candidate.shipment_at(terminal.offset(1)),
        ship_m2: candidate.shipment_at(terminal.offset(2)),
    }
}

#[async_trait]
impl Scorer<CohortQuery, ProjectCandidate> for ForwardShipmentScorer {
    async fn score(
        &self,
        _query: &CohortQuery,
        candidates: &[ProjectCandidate],
    ) -> Result<Vec<ProjectCandidate>, String> {
        Ok(candidates
            .par_iter()
            .map(|c| ProjectCandidate {
                shipment: Some(forward_shipment(c)),
                ..ProjectCandidate::default()
            })
            .collect())
    }

    fn update(&self, candidate: &mut ProjectCandidate, scored: ProjectCandidate) {
        candidate.shipment = scored.shipment;
    }
}
