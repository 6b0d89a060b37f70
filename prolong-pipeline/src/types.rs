use std::fmt;

use serde::Serialize;

use crate::candidate_pipeline::HasRequestId;
use crate::period::Period;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Request for a prolongation cohort report.
#[derive(Clone, Debug)]
pub struct CohortQuery {
    pub request_id: String,
    /// Calendar year the renewal outcomes must fall into. `None` lets the
    /// query hydrator pick the latest year present in the shipment table.
    pub reporting_year: Option<i32>,
}

impl CohortQuery {
    pub fn new(request_id: impl Into<String>, reporting_year: Option<i32>) -> Self {
        Self {
            request_id: request_id.into(),
            reporting_year,
        }
    }
}

impl HasRequestId for CohortQuery {
    fn request_id(&self) -> &str {
        &self.request_id
    }
}

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// Parsed content of a single month cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub enum ShipmentValue {
    /// Empty cell or unparseable token.
    #[default]
    Missing,
    /// Contract ended ("стоп" / "end").
    Stop,
    /// Shipment amount. Zeroed-out tokens become `Amount(0.0)`.
    Amount(f64),
}

impl ShipmentValue {
    pub fn amount(&self) -> Option<f64> {
        match self {
            ShipmentValue::Amount(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, ShipmentValue::Stop)
    }

    /// True only for a defined amount of exactly zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, ShipmentValue::Amount(v) if *v == 0.0)
    }
}

impl fmt::Display for ShipmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentValue::Missing => write!(f, "-"),
            ShipmentValue::Stop => write!(f, "stop"),
            ShipmentValue::Amount(v) => write!(f, "{}", v),
        }
    }
}

/// One month cell of one shipment row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub project_id: i64,
    pub period: Period,
    /// The trimmed cell text, `None` for an empty cell.
    pub raw_token: Option<String>,
    pub value: ShipmentValue,
}

impl Observation {
    pub fn is_stop(&self) -> bool {
        self.value.is_stop()
    }
}

// ---------------------------------------------------------------------------
// Candidate types
// ---------------------------------------------------------------------------

/// Shipment measured around a project's terminal period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ForwardShipment {
    /// Shipment at the terminal month, or at the month before it when the
    /// terminal month is entirely zeroed out.
    pub ship_last: f64,
    /// Shipment one month after the terminal month.
    pub ship_m1: f64,
    /// Shipment two months after the terminal month.
    pub ship_m2: f64,
}

/// A project flowing through the prolongation pipeline.
#[derive(Clone, Debug, Default)]
pub struct ProjectCandidate {
    pub project_id: i64,
    /// Account label from the shipment table (first non-empty across rows).
    pub account: Option<String>,
    /// Duplicate-row reasons from the shipment table, joined with "; ".
    pub duplicate_reason: Option<String>,
    /// Observations of every shipment row for this id, sorted by period.
    pub observations: Vec<Observation>,

    // Hydrated fields
    /// Roster manager, falling back to the account label.
    pub manager: Option<String>,
    /// Renewal month scheduled in the roster, when it parses.
    pub scheduled_renewal: Option<Period>,
    /// The roster lists the project with a parseable renewal month. Projects
    /// without it have no usable terminal date for cohort purposes.
    pub roster_resolved: bool,
    /// Latest period with a numeric value.
    pub terminal_period: Option<Period>,
    /// Earliest period carrying a stop token.
    pub stop_marker: Option<Period>,

    // Scored fields
    pub shipment: Option<ForwardShipment>,
}

impl ProjectCandidate {
    /// Sum of the numeric values observed at `period`. Missing and stop
    /// cells contribute nothing; no observation at all sums to 0.
    pub fn shipment_at(&self, period: Period) -> f64 {
        self.observations_at(period)
            .filter_map(|o| o.value.amount())
            .sum()
    }

    pub fn observations_at(&self, period: Period) -> impl Iterator<Item = &Observation> {
        self.observations.iter().filter(move |o| o.period == period)
    }

    /// Terminal period as seen by the cohorts: undefined unless the roster
    /// resolved the project.
    pub fn cohort_terminal(&self) -> Option<Period> {
        self.terminal_period.filter(|_| self.roster_resolved)
    }

    /// Freeze the candidate into its report row.
    pub fn summary(&self) -> ProjectSummary {
        let shipment = self.shipment.unwrap_or_default();
        let terminal = self.cohort_terminal();
        ProjectSummary {
            project_id: self.project_id,
            manager: self.manager.clone(),
            account: self.account.clone(),
            duplicate_reason: self.duplicate_reason.clone(),
            final_year: terminal.map(|p| p.year),
            final_month: terminal.map(|p| p.month),
            scheduled_renewal: self.scheduled_renewal,
            ship_last: shipment.ship_last,
            ship_m1: shipment.ship_m1,
            ship_m2: shipment.ship_m2,
        }
    }
}

/// Per-project diagnostic row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_id: i64,
    pub manager: Option<String>,
    pub account: Option<String>,
    pub duplicate_reason: Option<String>,
    pub final_year: Option<i32>,
    pub final_month: Option<u32>,
    pub scheduled_renewal: Option<Period>,
    pub ship_last: f64,
    pub ship_m1: f64,
    pub ship_m2: f64,
}

impl ProjectSummary {
    pub fn terminal_period(&self) -> Option<Period> {
        Period::new(self.final_year?, self.final_month?)
    }
}
