//! Report assembly from the pipeline's selected projects.

use serde::Serialize;

use crate::candidate_pipeline::PipelineResult;
use crate::cohort::{manager_cohorts, monthly_cohorts, top_managers, ManagerCohort, MonthlyCohort};
use crate::error::{ProlongError, ProlongResult};
use crate::types::{CohortQuery, ProjectCandidate, ProjectSummary};

/// Department-level headline figures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CohortOverview {
    pub reporting_year: i32,
    pub project_count: usize,
    pub coef_m1: f64,
    pub coef_m2: f64,
    pub top_managers: Vec<ManagerCohort>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProlongationReport {
    pub reporting_year: i32,
    pub overview: CohortOverview,
    pub monthly: Vec<MonthlyCohort>,
    /// Manager rows sorted by name; the department row comes last.
    pub managers: Vec<ManagerCohort>,
    /// In-scope projects ordered by id.
    pub projects: Vec<ProjectSummary>,
}

impl ProlongationReport {
    pub fn department(&self) -> Option<&ManagerCohort> {
        self.managers.iter().find(|c| c.is_department)
    }
}

/// Either a full report or a notice that no project falls into the year.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CohortReport {
    Ready(ProlongationReport),
    NoData { reporting_year: i32 },
}

impl CohortReport {
    pub fn reporting_year(&self) -> i32 {
        match self {
            CohortReport::Ready(report) => report.reporting_year,
            CohortReport::NoData { reporting_year } => *reporting_year,
        }
    }

    /// Aggregate `summaries` into the report for `reporting_year`.
    pub fn build(reporting_year: i32, summaries: Vec<ProjectSummary>, top_n: usize) -> Self {
        if summaries.is_empty() {
            return CohortReport::NoData { reporting_year };
        }

        let monthly = monthly_cohorts(&summaries, reporting_year);
        let managers = manager_cohorts(&summaries);
        let (coef_m1, coef_m2) = managers
            .iter()
            .find(|c| c.is_department)
            .map(|d| (d.coef_m1, d.coef_m2))
            .unwrap_or_default();

        let overview = CohortOverview {
            reporting_year,
            project_count: summaries.len(),
            coef_m1,
            coef_m2,
            top_managers: top_managers(&managers, top_n),
        };

        CohortReport::Ready(ProlongationReport {
            reporting_year,
            overview,
            monthly,
            managers,
            projects: summaries,
        })
    }

    /// Build the report from a finished pipeline run.
    pub fn from_result(
        result: &PipelineResult<CohortQuery, ProjectCandidate>,
        top_n: usize,
    ) -> ProlongResult<Self> {
        let reporting_year = result
            .query
            .reporting_year
            .ok_or(ProlongError::UnresolvedReportingYear)?;
        let summaries = result
            .selected_candidates
            .iter()
            .map(ProjectCandidate::summary)
            .collect();
        Ok(Self::build(reporting_year, summaries, top_n))
    }
}
