use async_trait::async_trait;

use crate::hydrator::Hydrator;
use crate::period::Period;
use crate::types::{CohortQuery, Observation, ProjectCandidate};

/// Resolves each project's terminal period and stop marker.
pub struct TerminalPeriodHydrator;

/// Latest period with a numeric value. Zero counts; stop and missing do not.
pub fn terminal_period(observations: &[Observation]) -> Option<Period> {
    observations
        .iter()
        .filter(|o| o.value.amount().is_some())
        .map(|o| o.period)
        .max()
}

/// Earliest period carrying a stop token.
pub fn stop_marker(observations: &[Observation]) -> Option<Period> {
    observations
        .iter()
        .filter(|o| o.is_stop())
        .map(|o| o.period)
        .min()
}

#[async_trait]
impl Hydrator<CohortQuery, ProjectCandidate> for TerminalPeriodHydrator {
    async fn hydrate(
        &self,
        _query: &CohortQuery,
        candidates: &[ProjectCandidate],
    ) -> Result<Vec<ProjectCandidate>, String> {
        Ok(candidates
            .iter()
            .map(|c| ProjectCandidate {
                terminal_period: terminal_period(&c.observations),
                stop_marker: stop_marker(&c.observations),
                ..ProjectCandidate::default()
            })
            .collect())
    }

    fn update(&self, candidate: &mut ProjectCandidate, hydrated: ProjectCandidate) {
        candidate.terminal_period = hydrated.terminal_period;
        candidate.stop_marker = hydrated.stop_marker;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShipmentValue;

    fn obs(year: i32, month: u32, value: ShipmentValue) -> Observation {
        Observation {
            project_id: 1,
            period: Period::new(year, month).unwrap(),
            raw_token: None,
            value,
        }
    }

    #[test]
    fn zero_counts_as_activity() {
        let observations = vec![
            obs(2023, 1, ShipmentValue::Amount(150.0)),
            obs(2023, 2, ShipmentValue::Amount(0.0)),
            obs(2023, 3, ShipmentValue::Missing),
        ];
        assert_eq!(terminal_period(&observations), Period::new(2023, 2));
    }

    #[test]
    fn stop_tokens_are_not_activity() {
        let only_stop = vec![obs(2023, 4, ShipmentValue::Stop)];
        assert_eq!(terminal_period(&only_stop), None);
        assert_eq!(stop_marker(&only_stop), Period::new(2023, 4));
    }

    #[test]
    fn gaps_are_tolerated() {
        let observations = vec![
            obs(2022, 11, ShipmentValue::Amount(10.0)),
            obs(2023, 1, ShipmentValue::Missing),
            obs(2023, 5, ShipmentValue::Amount(20.0)),
            obs(2023, 6, ShipmentValue::Missing),
        ];
        assert_eq!(terminal_period(&observations), Period::new(2023, 5));
    }

    #[test]
    fn earliest_stop_wins() {
        let observations = vec![
            obs(2023, 3, ShipmentValue::Stop),
            obs(2023, 5, ShipmentValue::Stop),
        ];
        assert_eq!(stop_marker(&observations), Period::new(2023, 3));
        assert_eq!(stop_marker(&[]), None);
    }

    #[tokio::test]
    async fn hydrator_sets_both_periods() {
        let candidate = ProjectCandidate {
            project_id: 1,
            observations: vec![
                obs(2023, 1, ShipmentValue::Amount(100.0)),
                obs(2023, 2, ShipmentValue::Amount(50.0)),
                obs(2023, 3, ShipmentValue::Stop),
            ],
            ..ProjectCandidate::default()
        };
        let query = CohortQuery::new("t", Some(2023));
        let hydrated = TerminalPeriodHydrator
            .hydrate(&query, std::slice::from_ref(&candidate))
            .await
            .unwrap();

        let mut updated = candidate.clone();
        TerminalPeriodHydrator.update_all(std::slice::from_mut(&mut updated), hydrated);
        assert_eq!(updated.terminal_period, Period::new(2023, 2));
        assert_eq!(updated.stop_marker, Period::new(2023, 3));
        assert_eq!(updated.observations.len(), 3);
    }
}
