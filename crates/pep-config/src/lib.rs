//! # pep-config
//!
//! Layered configuration loading for the peptide page pipeline using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PEPTIDE_*` prefix, `__` as separator)
//! 2. Project-level `.peptide/config.toml`
//! 3. User-level `~/.config/peptide/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PEPTIDE_LLM__API_KEY` -> `llm.api_key`,
//! `PEPTIDE_R2__ACCOUNT_ID` -> `r2.account_id`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use pep_config::PepConfig;
//!
//! let config = PepConfig::load_with_dotenv().expect("config");
//! if config.r2.is_configured() {
//!     println!("Bucket: {}", config.r2.bucket_name);
//! }
//! ```

mod error;
mod llm;
mod pipeline;
mod r2;
mod sources;
mod store;

pub use error::ConfigError;
pub use llm::LlmConfig;
pub use pipeline::{DesignCaps, PipelineConfig};
pub use r2::R2Config;
pub use sources::SourcesConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PepConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub r2: R2Config,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl PepConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory or
    /// the workspace root.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".peptide/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("PEPTIDE_").split("__"))
    }

    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.page_size == 0 || self.sources.page_size > 1000 {
            return Err(ConfigError::invalid(
                "sources.page_size",
                format!("must be in 1..=1000, got {}", self.sources.page_size),
            ));
        }
        if self.sources.max_results == 0 {
            return Err(ConfigError::invalid("sources.max_results", "must be positive"));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::invalid("llm.max_tokens", "must be positive"));
        }
        if self.llm.input_usd_per_mtok < 0.0 || self.llm.output_usd_per_mtok < 0.0 {
            return Err(ConfigError::invalid("llm", "token prices must not be negative"));
        }
        if self.pipeline.retry_attempts == 0 {
            return Err(ConfigError::invalid(
                "pipeline.retry_attempts",
                "must allow at least one attempt",
            ));
        }
        if self.pipeline.retry_base_ms > self.pipeline.retry_max_ms {
            return Err(ConfigError::invalid(
                "pipeline.retry_base_ms",
                "must not exceed pipeline.retry_max_ms",
            ));
        }
        Ok(())
    }

    /// Error unless the text-generation provider has credentials.
    pub fn require_llm(&self) -> Result<&LlmConfig, ConfigError> {
        if self.llm.is_configured() {
            Ok(&self.llm)
        } else {
            Err(ConfigError::NotConfigured {
                section: "llm".into(),
            })
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("peptide").join("config.toml"))
    }

    /// Load `.env` from the current directory, falling back to the workspace
    /// root when running under cargo. Missing files are ignored.
    fn load_dotenv() {
        if dotenvy::dotenv().is_ok() {
            return;
        }
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }
    }
}
