//! Entity structs for the pipeline domain.
//!
//! `Study` rows and `PageRecord`s map to tables in the libSQL metadata store
//! (see `pep-db`). All structs derive `Serialize` and `Deserialize` for JSON
//! roundtrip through the CLI and the store's payload columns.

mod page;
mod peptide;
mod study;

pub use page::{DISCLAIMERS, PageRecord, Section};
pub use peptide::{PeptideIdentity, StudySet, slugify, validate_slug};
pub use study::{LiteratureStudy, RegistryTrial, Study, parse_year};
