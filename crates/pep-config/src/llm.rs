//! Text-generation provider configuration.

use serde::{Deserialize, Serialize};

fn default_model() -> String {
    String::from("claude-sonnet-4-5")
}

fn default_base_url() -> String {
    String::from("https://api.anthropic.com")
}

const fn default_max_tokens() -> u32 {
    8192
}

const fn default_timeout_secs() -> u64 {
    180
}

const fn default_input_usd_per_mtok() -> f64 {
    3.0
}

const fn default_output_usd_per_mtok() -> f64 {
    15.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider API key. Usually supplied via `PEPTIDE_LLM__API_KEY`.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Output token ceiling for the synthesis call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Price per million input tokens, in US dollars.
    #[serde(default = "default_input_usd_per_mtok")]
    pub input_usd_per_mtok: f64,

    /// Price per million output tokens, in US dollars.
    #[serde(default = "default_output_usd_per_mtok")]
    pub output_usd_per_mtok: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            input_usd_per_mtok: default_input_usd_per_mtok(),
            output_usd_per_mtok: default_output_usd_per_mtok(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.model.is_empty()
    }
}
