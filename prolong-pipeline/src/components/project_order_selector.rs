use std::cmp::Ordering;

use crate::selector::Selector;
use crate::types::{CohortQuery, ProjectCandidate};

/// Orders projects by id. Nothing is truncated: every project in scope
/// contributes to the cohorts.
pub struct ProjectOrderSelector;

impl Selector<CohortQuery, ProjectCandidate> for ProjectOrderSelector {
    fn compare(&self, a: &ProjectCandidate, b: &ProjectCandidate) -> Ordering {
        a.project_id.cmp(&b.project_id)
    }
}
