//! # pep-evidence
//!
//! Pure, deterministic evidence handling: design inference for raw records,
//! study-set normalization, and the evidence grading rubric.

pub mod design;
pub mod grade;
pub mod normalize;

pub use design::{TrialDesignInfo, infer_literature_design, infer_trial_design};
pub use grade::{DesignCounts, explain, grade, missing_for_upgrade};
pub use normalize::{
    CategoryLimits, DEFAULT_MIN_ABSTRACT_CHARS, SortYear, filter_by_quality, limit_by_category,
    normalize,
};
