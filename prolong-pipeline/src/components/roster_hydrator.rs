use async_trait::async_trait;
use std::sync::Arc;

use crate::hydrator::Hydrator;
use crate::normalizer::parse_month_label;
use crate::table_loader::Roster;
use crate::types::{CohortQuery, ProjectCandidate};

/// Attaches the account manager and the scheduled renewal month from the
/// roster.
///
/// The roster manager wins; the shipment table's account label is only a
/// fallback for projects the roster does not know or leaves blank.
///
/// A project is roster-resolved only when the roster lists it with a
/// parseable month. Unresolved projects keep their manager but drop out of
/// the scope-filtered cohorts.
pub struct RosterHydrator {
    roster: Arc<Roster>,
}

impl RosterHydrator {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }

    fn hydrate_one(&self, candidate: &ProjectCandidate) -> ProjectCandidate {
        let entry = self.roster.get(candidate.project_id);

        let manager = entry
            .and_then(|e| e.manager.clone())
            .or_else(|| candidate.account.clone());

        let scheduled_renewal = match entry {
            None => {
                log::warn!("project {} not in roster, excluded from cohorts", candidate.project_id);
                None
            }
            Some(entry) => {
                let text = entry.scheduled_month.as_deref().unwrap_or("");
                let parsed = parse_month_label(text);
                if parsed.is_none() {
                    log::warn!(
                        "project {}: unparseable scheduled month '{}', excluded from cohorts",
                        candidate.project_id,
                        text
                    );
                }
                parsed
            }
        };

        ProjectCandidate {
            manager,
            scheduled_renewal,
            roster_resolved: scheduled_renewal.is_some(),
            ..ProjectCandidate::default()
        }
    }
}

#[async_trait]
impl Hydrator<CohortQuery, ProjectCandidate> for RosterHydrator {
    async fn hydrate(
        &self,
        _query: &CohortQuery,
        candidates: &[ProjectCandidate],
    ) -> Result<Vec<ProjectCandidate>, String> {
        Ok(candidates.iter().map(|c| self.hydrate_one(c)).collect())
    }

    fn update(&self, candidate: &mut ProjectCandidate, hydrated: ProjectCandidate) {
        candidate.manager = hydrated.manager;
        candidate.scheduled_renewal = hydrated.scheduled_renewal;
        candidate.roster_resolved = hydrated.roster_resolved;
    }
}
