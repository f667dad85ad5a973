//! # pep-pipeline
//!
//! Drives one peptide from literature search to a published page, and runs
//! lists of peptides sequentially.
//!
//! Every run produces a [`RunRecord`] with its status, the failing step if
//! any, per-step timings and the token cost spent so far. A run never
//! panics or returns an error to its caller.

mod batch;
mod driver;
mod error;
mod record;
mod settings;

pub use batch::{BatchEntry, BatchFileError, BatchReport, BatchRunner, parse_peptide_list};
pub use driver::PipelineDriver;
pub use error::PipelineError;
pub use record::{RunRecord, StepTiming};
pub use settings::{DriverOptions, category_limits, retry_config};
