//! Cohort aggregation of project summaries into renewal coefficients.
//!
//! Every coefficient is `forward_sum / base_sum` over a cohort, summed
//! before dividing so that large projects weigh more. A zero base always
//! yields a zero coefficient.
//!
//! M2 cohorts only count projects that did not ship in M+1: a project
//! already renewed one month after its terminal month must not earn
//! renewal credit twice.

use std::collections::{BTreeMap, HashMap};
use std::ops::AddAssign;

use serde::Serialize;

use crate::period::Period;
use crate::types::ProjectSummary;
use crate::vocabulary::{month_title, DEPARTMENT_LABEL};

/// Terminal months eligible for the annual M1 coefficient (M+1 stays in year).
const ANNUAL_M1_MONTHS: std::ops::RangeInclusive<u32> = 1..=11;
/// Terminal months eligible for the annual M2 coefficient (M+2 stays in year).
const ANNUAL_M2_MONTHS: std::ops::RangeInclusive<u32> = 1..=10;

/// Zero-guarded ratio.
pub fn coefficient(forward: f64, base: f64) -> f64 {
    if base > 0.0 {
        forward / base
    } else {
        0.0
    }
}

/// Base and forward shipment sums of one cohort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CohortSums {
    pub base_m1: f64,
    pub forward_m1: f64,
    /// Base of projects with no shipment in M+1.
    pub base_m2: f64,
    pub forward_m2: f64,
}

impl CohortSums {
    pub fn add_m1(&mut self, summary: &ProjectSummary) {
        self.base_m1 += summary.ship_last;
        self.forward_m1 += summary.ship_m1;
    }

    /// Adds the project only when it did not ship in M+1.
    pub fn add_m2(&mut self, summary: &ProjectSummary) {
        if summary.ship_m1 == 0.0 {
            self.base_m2 += summary.ship_last;
            self.forward_m2 += summary.ship_m2;
        }
    }

    pub fn coef_m1(&self) -> f64 {
        coefficient(self.forward_m1, self.base_m1)
    }

    pub fn coef_m2(&self) -> f64 {
        coefficient(self.forward_m2, self.base_m2)
    }
}

impl AddAssign for CohortSums {
    fn add_assign(&mut self, other: Self) {
        self.base_m1 += other.base_m1;
        self.forward_m1 += other.forward_m1;
        self.base_m2 += other.base_m2;
        self.forward_m2 += other.forward_m2;
    }
}

// ---------------------------------------------------------------------------
// Monthly cohorts
// ---------------------------------------------------------------------------

/// Renewal coefficients observed in one calendar month of the reporting
/// year: M1 over projects terminal one month earlier, M2 over projects
/// terminal two months earlier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyCohort {
    pub year: i32,
    pub month: u32,
    pub title: &'static str,
    pub coef_m1: f64,
    pub coef_m2: f64,
    #[serde(flatten)]
    pub sums: CohortSums,
}

/// One row per calendar month 1..=12 of `reporting_year`. January looks
/// back into the previous year's November and December.
pub fn monthly_cohorts(summaries: &[ProjectSummary], reporting_year: i32) -> Vec<MonthlyCohort> {
    let mut by_terminal: HashMap<Period, Vec<&ProjectSummary>> = HashMap::new();
    for summary in summaries {
        if let Some(terminal) = summary.terminal_period() {
            by_terminal.entry(terminal).or_default().push(summary);
        }
    }

    (1..=12)
        .filter_map(|month| Period::new(reporting_year, month))
        .map(|period| {
            let mut sums = CohortSums::default();
            for summary in by_terminal.get(&period.offset(-1)).into_iter().flatten() {
                sums.add_m1(summary);
            }
            for summary in by_terminal.get(&period.offset(-2)).into_iter().flatten() {
                sums.add_m2(summary);
            }
            MonthlyCohort {
                year: period.year,
                month: period.month,
                title: month_title(period.month),
                coef_m1: sums.coef_m1(),
                coef_m2: sums.coef_m2(),
                sums,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Manager cohorts
// ---------------------------------------------------------------------------

/// Annual renewal coefficients of one manager, or of the whole department.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManagerCohort {
    pub manager: String,
    pub is_department: bool,
    pub project_count: usize,
    pub coef_m1: f64,
    pub coef_m2: f64,
    #[serde(flatten)]
    pub sums: CohortSums,
}

impl ManagerCohort {
    fn new(manager: String, is_department: bool, project_count: usize, sums: CohortSums) -> Self {
        Self {
            manager,
            is_department,
            project_count,
            coef_m1: sums.coef_m1(),
            coef_m2: sums.coef_m2(),
            sums,
        }
    }
}

/// One row per manager, sorted by name, followed by the department row.
///
/// M1 counts projects terminal in January..November, M2 those terminal in
/// January..October without M+1 shipment. Projects without a manager are
/// left out. The department row adds the managers' sums before dividing.
pub fn manager_cohorts(summaries: &[ProjectSummary]) -> Vec<ManagerCohort> {
    let mut by_manager: BTreeMap<&str, (usize, CohortSums)> = BTreeMap::new();
    for summary in summaries {
        let (Some(manager), Some(terminal)) = (summary.manager.as_deref(), summary.terminal_period())
        else {
            continue;
        };
        let (count, sums) = by_manager.entry(manager).or_default();
        *count += 1;
        if ANNUAL_M1_MONTHS.contains(&terminal.month) {
            sums.add_m1(summary);
        }
        if ANNUAL_M2_MONTHS.contains(&terminal.month) {
            sums.add_m2(summary);
        }
    }

    let mut department = CohortSums::default();
    let mut department_count = 0;
    let mut rows: Vec<ManagerCohort> = by_manager
        .into_iter()
        .map(|(manager, (count, sums))| {
            department += sums;
            department_count += count;
            ManagerCohort::new(manager.to_string(), false, count, sums)
        })
        .collect();

    rows.push(ManagerCohort::new(
        DEPARTMENT_LABEL.to_string(),
        true,
        department_count,
        department,
    ));
    rows
}

/// Best `n` managers by annual M1 coefficient; ties broken by name.
pub fn top_managers(cohorts: &[ManagerCohort], n: usize) -> Vec<ManagerCohort> {
    let mut managers: Vec<ManagerCohort> = cohorts.iter().filter(|c| !c.is_department).cloned().collect();
    managers.sort_by(|a, b| {
        b.coef_m1
            .total_cmp(&a.coef_m1)
            .then_with(|| a.manager.cmp(&b.manager))
    });
    managers.truncate(n);
    managers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, manager: &str, terminal: (i32, u32), last: f64, m1: f64, m2: f64) -> ProjectSummary {
        ProjectSummary {
            project_id: id,
            manager: Some(manager.to_string()),
            account: None,
            duplicate_reason: None,
            final_year: Some(terminal.0),
            final_month: Some(terminal.1),
            scheduled_renewal: None,
            ship_last: last,
            ship_m1: m1,
            ship_m2: m2,
        }
    }

    #[test]
    fn coefficient_is_zero_guarded() {
        assert_eq!(coefficient(10.0, 0.0), 0.0);
        assert_eq!(coefficient(0.0, 0.0), 0.0);
        assert_eq!(coefficient(25.0, 100.0), 0.25);
        assert_eq!(coefficient(5.0, -3.0), 0.0);
    }

    #[test]
    fn may_cohort_uses_april_terminal_projects() {
        let summaries = vec![
            summary(1, "А", (2023, 4), 600.0, 250.0, 0.0),
            summary(2, "Б", (2023, 4), 400.0, 0.0, 100.0),
            summary(3, "Б", (2023, 5), 900.0, 900.0, 0.0),
        ];
        let monthly = monthly_cohorts(&summaries, 2023);
        assert_eq!(monthly.len(), 12);
        let may = &monthly[4];
        assert_eq!(may.month, 5);
        assert_eq!(may.title, "Май");
        assert_eq!(may.sums.base_m1, 1000.0);
        assert_eq!(may.sums.forward_m1, 250.0);
        assert_eq!(may.coef_m1, 0.25);
    }

    #[test]
    fn m2_excludes_projects_renewed_in_m1() {
        let summaries = vec![
            summary(1, "А", (2023, 3), 600.0, 250.0, 300.0),
            summary(2, "А", (2023, 3), 400.0, 0.0, 100.0),
        ];
        let monthly = monthly_cohorts(&summaries, 2023);
        let may = &monthly[4];
        assert_eq!(may.sums.base_m2, 400.0);
        assert_eq!(may.sums.forward_m2, 100.0);
        assert_eq!(may.coef_m2, 0.25);
        // April: M1 over March terminals includes both
        assert_eq!(monthly[3].sums.base_m1, 1000.0);
    }

    #[test]
    fn january_looks_back_into_previous_year() {
        let summaries = vec![
            summary(1, "А", (2022, 12), 100.0, 50.0, 0.0),
            summary(2, "А", (2022, 11), 200.0, 0.0, 40.0),
        ];
        let monthly = monthly_cohorts(&summaries, 2023);
        let january = &monthly[0];
        assert_eq!(january.coef_m1, 0.5);
        assert_eq!(january.coef_m2, 0.2);
    }

    #[test]
    fn empty_months_have_zero_coefficients() {
        let monthly = monthly_cohorts(&[], 2023);
        assert!(monthly.iter().all(|m| m.coef_m1 == 0.0 && m.coef_m2 == 0.0));
        assert!(monthly.iter().all(|m| m.sums == CohortSums::default()));
    }

    #[test]
    fn manager_windows_exclude_late_terminal_months() {
        let summaries = vec![
            summary(1, "Иванов", (2023, 10), 100.0, 0.0, 50.0),
            summary(2, "Иванов", (2023, 11), 200.0, 100.0, 0.0),
            summary(3, "Иванов", (2023, 12), 300.0, 300.0, 300.0),
        ];
        let rows = manager_cohorts(&summaries);
        let ivanov = &rows[0];
        assert_eq!(ivanov.manager, "Иванов");
        assert_eq!(ivanov.project_count, 3);
        // M1: October + November
        assert_eq!(ivanov.sums.base_m1, 300.0);
        assert_eq!(ivanov.sums.forward_m1, 100.0);
        // M2: October only
        assert_eq!(ivanov.sums.base_m2, 100.0);
        assert_eq!(ivanov.sums.forward_m2, 50.0);
        assert_eq!(ivanov.coef_m2, 0.5);
    }

    #[test]
    fn department_is_volume_weighted() {
        let summaries = vec![
            summary(1, "Большой", (2023, 1), 900.0, 900.0, 0.0),
            summary(2, "Малый", (2023, 1), 100.0, 0.0, 0.0),
        ];
        let rows = manager_cohorts(&summaries);
        assert_eq!(rows.len(), 3);
        let department = rows.last().unwrap();
        assert!(department.is_department);
        assert_eq!(department.manager, DEPARTMENT_LABEL);
        assert_eq!(department.project_count, 2);
        // (1.0 + 0.0) / 2 would be 0.5; summing first gives 0.9
        assert_eq!(department.coef_m1, 0.9);
    }

    #[test]
    fn projects_without_manager_are_skipped() {
        let mut orphan = summary(1, "x", (2023, 1), 100.0, 100.0, 0.0);
        orphan.manager = None;
        let rows = manager_cohorts(&[orphan]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sums, CohortSums::default());
    }

    #[test]
    fn top_managers_ranks_by_m1() {
        let summaries = vec![
            summary(1, "В", (2023, 1), 100.0, 50.0, 0.0),
            summary(2, "А", (2023, 1), 100.0, 50.0, 0.0),
            summary(3, "Б", (2023, 1), 100.0, 90.0, 0.0),
        ];
        let rows = manager_cohorts(&summaries);
        let top: Vec<String> = top_managers(&rows, 2).into_iter().map(|c| c.manager).collect();
        assert_eq!(top, vec!["Б", "А"]);
    }
}
