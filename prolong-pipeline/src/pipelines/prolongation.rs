use async_trait::async_trait;
use std::sync::Arc;

use crate::candidate_pipeline::CandidatePipeline;
use crate::components::forward_shipment_scorer::ForwardShipmentScorer;
use crate::components::project_order_selector::ProjectOrderSelector;
use crate::components::reporting_scope_filter::ReportingScopeFilter;
use crate::components::reporting_year_query_hydrator::ReportingYearQueryHydrator;
use crate::components::roster_hydrator::RosterHydrator;
use crate::components::run_summary_side_effect::RunSummarySideEffect;
use crate::components::shipment_source::ShipmentSource;
use crate::components::stop_validity_filter::StopValidityFilter;
use crate::components::terminal_period_hydrator::TerminalPeriodHydrator;
use crate::error::{ProlongError, ProlongResult};
use crate::filter::Filter;
use crate::hydrator::Hydrator;
use crate::query_hydrator::QueryHydrator;
use crate::report::CohortReport;
use crate::scorer::Scorer;
use crate::selector::Selector;
use crate::side_effect::SideEffect;
use crate::source::Source;
use crate::table_loader::{Roster, ShipmentTable};
use crate::types::{CohortQuery, ProjectCandidate};

/// The contract prolongation pipeline.
///
/// Pipeline flow:
/// 1. ReportingYearQueryHydrator defaults the year to the latest one in the data
/// 2. ShipmentSource normalizes the wide table into one candidate per project
/// 3. TerminalPeriodHydrator and RosterHydrator run concurrently
/// 4. StopValidityFilter drops projects whose stop precedes their last shipment
/// 5. ForwardShipmentScorer measures shipment at M, M+1 and M+2
/// 6. ProjectOrderSelector orders by project id
/// 7. ReportingScopeFilter keeps projects whose M+1 or M+2 lands in the year
/// 8. RunSummarySideEffect logs the run
pub struct ProlongationPipeline {
    query_hydrators: Vec<Box<dyn QueryHydrator<CohortQuery>>>,
    sources: Vec<Box<dyn Source<CohortQuery, ProjectCandidate>>>,
    hydrators: Vec<Box<dyn Hydrator<CohortQuery, ProjectCandidate>>>,
    filters: Vec<Box<dyn Filter<CohortQuery, ProjectCandidate>>>,
    scorers: Vec<Box<dyn Scorer<CohortQuery, ProjectCandidate>>>,
    selector: ProjectOrderSelector,
    post_selection_hydrators: Vec<Box<dyn Hydrator<CohortQuery, ProjectCandidate>>>,
    post_selection_filters: Vec<Box<dyn Filter<CohortQuery, ProjectCandidate>>>,
    side_effects: Arc<Vec<Box<dyn SideEffect<CohortQuery, ProjectCandidate>>>>,
    result_size: usize,
}

impl ProlongationPipeline {
    pub fn new(shipments: ShipmentTable, roster: Roster) -> Self {
        let query_hydrators: Vec<Box<dyn QueryHydrator<CohortQuery>>> =
            vec![Box::new(ReportingYearQueryHydrator::from_table(&shipments))];

        let sources: Vec<Box<dyn Source<CohortQuery, ProjectCandidate>>> =
            vec![Box::new(ShipmentSource::new(Arc::new(shipments)))];

        let hydrators: Vec<Box<dyn Hydrator<CohortQuery, ProjectCandidate>>> = vec![
            Box::new(TerminalPeriodHydrator),
            Box::new(RosterHydrator::new(Arc::new(roster))),
        ];

        let filters: Vec<Box<dyn Filter<CohortQuery, ProjectCandidate>>> =
            vec![Box::new(StopValidityFilter)];

        let scorers: Vec<Box<dyn Scorer<CohortQuery, ProjectCandidate>>> =
            vec![Box::new(ForwardShipmentScorer)];

        let post_selection_filters: Vec<Box<dyn Filter<CohortQuery, ProjectCandidate>>> =
            vec![Box::new(ReportingScopeFilter)];

        let side_effects: Arc<Vec<Box<dyn SideEffect<CohortQuery, ProjectCandidate>>>> =
            Arc::new(vec![Box::new(RunSummarySideEffect)]);

        Self {
            query_hydrators,
            sources,
            hydrators,
            filters,
            scorers,
            selector: ProjectOrderSelector,
            post_selection_hydrators: Vec::new(),
            post_selection_filters,
            side_effects,
            result_size: usize::MAX,
        }
    }

    /// Run the pipeline and aggregate its output into a cohort report.
    ///
    /// Fails before any candidate is fetched when the reporting year cannot
    /// be resolved: the scope filter would otherwise pass every project.
    pub async fn report(&self, query: CohortQuery, top_managers: usize) -> ProlongResult<CohortReport> {
        let query = self.hydrate_query(query).await;
        if query.reporting_year.is_none() {
            return Err(ProlongError::UnresolvedReportingYear);
        }
        let result = self.execute(query).await;
        CohortReport::from_result(&result, top_managers)
    }
}

#[async_trait]
impl CandidatePipeline<CohortQuery, ProjectCandidate> for ProlongationPipeline {
    fn query_hydrators(&self) -> &[Box<dyn QueryHydrator<CohortQuery>>] {
        &self.query_hydrators
    }

    fn sources(&self) -> &[Box<dyn Source<CohortQuery, ProjectCandidate>>] {
        &self.sources
    }

    fn hydrators(&self) -> &[Box<dyn Hydrator<CohortQuery, ProjectCandidate>>] {
        &self.hydrators
    }

    fn filters(&self) -> &[Box<dyn Filter<CohortQuery, ProjectCandidate>>] {
        &self.filters
    }

    fn scorers(&self) -> &[Box<dyn Scorer<CohortQuery, ProjectCandidate>>] {
        &self.scorers
    }

    fn selector(&self) -> &dyn Selector<CohortQuery, ProjectCandidate> {
        &self.selector
    }

    fn post_selection_hydrators(&self) -> &[Box<dyn Hydrator<CohortQuery, ProjectCandidate>>] {
        &self.post_selection_hydrators
    }

    fn post_selection_filters(&self) -> &[Box<dyn Filter<CohortQuery, ProjectCandidate>>] {
        &self.post_selection_filters
    }

    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<CohortQuery, ProjectCandidate>>>> {
        Arc::clone(&self.side_effects)
    }

    fn result_size(&self) -> usize {
        self.result_size
    }
}
