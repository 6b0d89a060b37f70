pub mod candidate_pipeline;
pub mod cohort;
pub mod components;
pub mod error;
pub mod filter;
pub mod hydrator;
pub mod normalizer;
pub mod period;
pub mod pipelines;
pub mod query_hydrator;
pub mod report;
pub mod scorer;
pub mod selector;
pub mod side_effect;
pub mod source;
pub mod table_loader;
pub mod types;
pub mod util;
pub mod vocabulary;

pub use error::{ProlongError, ProlongResult};
pub use pipelines::prolongation::ProlongationPipeline;
pub use report::{CohortOverview, CohortReport, ProlongationReport};
pub use table_loader::{load_roster_file, load_shipments_file, Roster, ShipmentTable};
pub use types::{CohortQuery, ProjectSummary};
