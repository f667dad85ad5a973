//! Literature source configuration (Europe PMC and ClinicalTrials.gov).

use serde::{Deserialize, Serialize};

fn default_europe_pmc_url() -> String {
    String::from("https://www.ebi.ac.uk/europepmc/webservices/rest")
}

fn default_clinical_trials_url() -> String {
    String::from("https://clinicaltrials.gov/api/v2")
}

fn default_user_agent() -> String {
    String::from("peptide-pages/0.1")
}

const fn default_page_size() -> u32 {
    100
}

const fn default_max_results() -> u32 {
    300
}

const fn default_request_delay_ms() -> u64 {
    350
}

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Europe PMC REST base URL.
    #[serde(default = "default_europe_pmc_url")]
    pub europe_pmc_url: String,

    /// ClinicalTrials.gov API v2 base URL.
    #[serde(default = "default_clinical_trials_url")]
    pub clinical_trials_url: String,

    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on records fetched per source per peptide.
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Pause between consecutive page requests to the same provider.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Contact address sent to providers that ask for one.
    #[serde(default)]
    pub contact_email: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            europe_pmc_url: default_europe_pmc_url(),
            clinical_trials_url: default_clinical_trials_url(),
            page_size: default_page_size(),
            max_results: default_max_results(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            contact_email: String::new(),
        }
    }
}
