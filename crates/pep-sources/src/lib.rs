//! # pep-sources
//!
//! Literature HTTP clients for the peptide page pipeline.
//!
//! - Europe PMC (articles, PubMed-indexed records)
//! - ClinicalTrials.gov API v2 (trial registry)
//!
//! [`ingest`] queries both concurrently for one peptide and merges the
//! results. One failing provider degrades to a partial result; only when
//! every provider fails is the run aborted.

pub mod clinical_trials;
pub mod europe_pmc;

mod error;
mod http;

pub use error::{IngestError, SourceError, SourceFailure};
pub use http::with_retry;

use std::time::Duration;

use async_trait::async_trait;
use pep_config::SourcesConfig;
use pep_core::{PeptideIdentity, Study, retry::RetryConfig};

// ── Capability ─────────────────────────────────────────────────────

/// Searchable literature provider(s) for one peptide's name and aliases.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Articles matching any of `terms`.
    async fn search_articles(&self, terms: &[String]) -> Result<Vec<Study>, SourceError>;

    /// Registry trials matching any of `terms`.
    async fn search_trials(&self, terms: &[String]) -> Result<Vec<Study>, SourceError>;
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for Europe PMC and ClinicalTrials.gov.
pub struct SourceClient {
    http: reqwest::Client,
    settings: SourcesConfig,
    retry: RetryConfig,
}

impl SourceClient {
    /// Build a client from source settings and a retry schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// fails to build.
    pub fn new(settings: SourcesConfig, retry: RetryConfig) -> Result<Self, SourceError> {
        let user_agent = if settings.contact_email.is_empty() {
            settings.user_agent.clone()
        } else {
            format!("{} (mailto:{})", settings.user_agent, settings.contact_email)
        };
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            settings,
            retry,
        })
    }

    /// Pause between page requests to stay under provider rate limits.
    async fn throttle(&self) {
        if self.settings.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.settings.request_delay_ms)).await;
        }
    }
}

#[async_trait]
impl LiteratureSource for SourceClient {
    async fn search_articles(&self, terms: &[String]) -> Result<Vec<Study>, SourceError> {
        self.search_europe_pmc(terms).await
    }

    async fn search_trials(&self, terms: &[String]) -> Result<Vec<Study>, SourceError> {
        self.search_clinical_trials(terms).await
    }
}

// ── Ingestion ──────────────────────────────────────────────────────

/// Merged ingestion result for one peptide.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Articles first, then trials, in provider order. Not yet deduplicated.
    pub studies: Vec<Study>,
    /// Providers that failed; their results are missing from `studies`.
    pub failures: Vec<SourceFailure>,
}

impl IngestOutcome {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Query articles and trials concurrently for `peptide`.
///
/// # Errors
///
/// Returns [`IngestError`] only when both providers fail.
pub async fn ingest(
    source: &dyn LiteratureSource,
    peptide: &PeptideIdentity,
) -> Result<IngestOutcome, IngestError> {
    let terms = peptide.search_terms();
    let (articles, trials) = tokio::join!(source.search_articles(&terms), source.search_trials(&terms));

    let mut outcome = IngestOutcome::default();
    for (name, result) in [
        (europe_pmc::SOURCE, articles),
        (clinical_trials::SOURCE, trials),
    ] {
        match result {
            Ok(studies) => {
                tracing::info!(source = name, peptide = %peptide.slug, count = studies.len(), "source searched");
                outcome.studies.extend(studies);
            }
            Err(e) => {
                tracing::warn!(source = name, peptide = %peptide.slug, %e, "source search failed");
                outcome.failures.push(SourceFailure {
                    source: name,
                    message: e.to_string(),
                });
            }
        }
    }

    if outcome.failures.len() == 2 {
        return Err(IngestError {
            peptide: peptide.slug.clone(),
            failures: outcome.failures,
        });
    }
    Ok(outcome)
}
