//! Pipeline driver and batch runner settings.

use serde::{Deserialize, Serialize};

const fn default_delay_between_ms() -> u64 {
    2_000
}

const fn default_true() -> bool {
    true
}

const fn default_min_abstract_chars() -> usize {
    100
}

const fn default_retry_attempts() -> u32 {
    4
}

const fn default_retry_base_ms() -> u64 {
    500
}

const fn default_retry_max_ms() -> u64 {
    30_000
}

/// Optional per-design caps on studies passed to synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DesignCaps {
    #[serde(default)]
    pub human_controlled_trial: Option<usize>,
    #[serde(default)]
    pub human_observational: Option<usize>,
    #[serde(default)]
    pub human_case_report: Option<usize>,
    #[serde(default)]
    pub animal_in_vivo: Option<usize>,
    #[serde(default)]
    pub animal_in_vitro: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Pause between peptides in a batch.
    #[serde(default = "default_delay_between_ms")]
    pub delay_between_ms: u64,

    /// Keep going after a peptide fails.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,

    /// Run the external compliance audit after the local checks.
    #[serde(default = "default_true")]
    pub full_audit: bool,

    /// Treat uncited studies as a blocking compliance failure.
    #[serde(default)]
    pub require_citation_completeness: bool,

    #[serde(default = "default_min_abstract_chars")]
    pub min_abstract_chars: usize,

    #[serde(default)]
    pub caps: DesignCaps,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delay_between_ms: default_delay_between_ms(),
            continue_on_error: default_true(),
            full_audit: default_true(),
            require_citation_completeness: false,
            min_abstract_chars: default_min_abstract_chars(),
            caps: DesignCaps::default(),
            retry_attempts: default_retry_attempts(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
        }
    }
}
