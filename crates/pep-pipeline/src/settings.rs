//! Driver options derived from `[pipeline]` configuration.

use std::time::Duration;

use pep_config::{DesignCaps, PipelineConfig};
use pep_core::StudyDesign;
use pep_core::retry::RetryConfig;
use pep_evidence::{CategoryLimits, DEFAULT_MIN_ABSTRACT_CHARS};

/// Per-run behaviour of [`PipelineDriver`](crate::PipelineDriver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    pub min_abstract_chars: usize,
    pub limits: CategoryLimits,
    /// Run the external audit after the quick checks pass.
    pub full_audit: bool,
    /// Fail the quick audit when any study is never cited.
    pub require_citation_completeness: bool,
    /// Ask for a lay summary of every section after synthesis.
    pub plain_summaries: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            min_abstract_chars: DEFAULT_MIN_ABSTRACT_CHARS,
            limits: CategoryLimits::default(),
            full_audit: true,
            require_citation_completeness: false,
            plain_summaries: true,
        }
    }
}

impl DriverOptions {
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_abstract_chars: config.min_abstract_chars,
            limits: category_limits(&config.caps),
            full_audit: config.full_audit,
            require_citation_completeness: config.require_citation_completeness,
            plain_summaries: true,
        }
    }
}

#[must_use]
pub fn category_limits(caps: &DesignCaps) -> CategoryLimits {
    [
        (StudyDesign::HumanControlledTrial, caps.human_controlled_trial),
        (StudyDesign::HumanObservational, caps.human_observational),
        (StudyDesign::HumanCaseReport, caps.human_case_report),
        (StudyDesign::AnimalInVivo, caps.animal_in_vivo),
        (StudyDesign::AnimalInVitro, caps.animal_in_vitro),
    ]
    .into_iter()
    .fold(CategoryLimits::default(), |limits, (design, cap)| match cap {
        Some(cap) => limits.with(design, cap),
        None => limits,
    })
}

/// Backoff schedule for external calls.
#[must_use]
pub fn retry_config(config: &PipelineConfig) -> RetryConfig {
    RetryConfig {
        max_attempts: config.retry_attempts.max(1),
        base_delay: Duration::from_millis(config.retry_base_ms),
        max_delay: Duration::from_millis(config.retry_max_ms),
    }
}
