//! Sequential batch runs over a peptide list.

use std::collections::HashSet;
use std::time::Duration;

use pep_config::PipelineConfig;
use pep_core::{CoreError, EvidenceGrade, PeptideIdentity, RunStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::PipelineDriver;
use crate::record::RunRecord;

#[derive(Debug, Error)]
pub enum BatchFileError {
    #[error("invalid batch file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid peptide entry: {0}")]
    Peptide(#[from] CoreError),

    #[error("peptide '{0}' is listed more than once")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct PeptideList {
    #[serde(default, rename = "peptide")]
    peptides: Vec<PeptideEntry>,
}

#[derive(Debug, Deserialize)]
struct PeptideEntry {
    name: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Parse a TOML peptide list:
///
/// ```toml
/// [[peptide]]
/// name = "BPC-157"
/// aliases = ["Body Protection Compound 157"]
///
/// [[peptide]]
/// name = "Thymosin beta-4"
/// slug = "tb-500"
/// ```
///
/// # Errors
///
/// Returns [`BatchFileError`] for malformed TOML, invalid slugs, or a slug
/// listed twice.
pub fn parse_peptide_list(input: &str) -> Result<Vec<PeptideIdentity>, BatchFileError> {
    let list: PeptideList = toml::from_str(input)?;
    let mut seen = HashSet::new();
    let mut peptides = Vec::with_capacity(list.peptides.len());
    for entry in list.peptides {
        let peptide = match entry.slug {
            Some(slug) => PeptideIdentity::new(slug, entry.name, entry.aliases)?,
            None => PeptideIdentity::from_name(entry.name, entry.aliases)?,
        };
        if !seen.insert(peptide.slug.clone()) {
            return Err(BatchFileError::Duplicate(peptide.slug));
        }
        peptides.push(peptide);
    }
    Ok(peptides)
}

/// One line of a batch report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub peptide: String,
    pub status: RunStatus,
    pub grade: Option<EvidenceGrade>,
    pub study_count: usize,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub pdf_url: Option<String>,
}

impl From<&RunRecord> for BatchEntry {
    fn from(run: &RunRecord) -> Self {
        Self {
            peptide: run.peptide.clone(),
            status: run.status,
            grade: run.grade,
            study_count: run.study_count,
            cost_usd: run.cost_usd,
            duration_ms: run.duration_ms,
            error: run.error.clone(),
            pdf_url: run.pdf_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// Slug whose failure stopped the batch, when `continue_on_error` was off.
    pub halted_by: Option<String>,
}

impl BatchReport {
    #[must_use]
    pub fn count(&self, status: RunStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    #[must_use]
    pub fn total_cost_usd(&self) -> f64 {
        self.entries.iter().map(|e| e.cost_usd).sum()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.halted_by.is_none() && self.entries.iter().all(|e| !e.status.is_failure())
    }
}

/// Runs peptides one after another through a single driver.
pub struct BatchRunner {
    driver: PipelineDriver,
    delay: Duration,
    continue_on_error: bool,
}

impl BatchRunner {
    #[must_use]
    pub const fn new(driver: PipelineDriver, delay: Duration, continue_on_error: bool) -> Self {
        Self {
            driver,
            delay,
            continue_on_error,
        }
    }

    #[must_use]
    pub const fn from_config(driver: PipelineDriver, config: &PipelineConfig) -> Self {
        Self::new(
            driver,
            Duration::from_millis(config.delay_between_ms),
            config.continue_on_error,
        )
    }

    #[must_use]
    pub const fn driver(&self) -> &PipelineDriver {
        &self.driver
    }

    /// Run every peptide, calling `on_done` after each one.
    ///
    /// A `Failed` run stops the batch unless `continue_on_error` is set.
    /// `NotReady` never stops it.
    pub async fn run_with<F>(&self, peptides: &[PeptideIdentity], mut on_done: F) -> BatchReport
    where
        F: FnMut(usize, &RunRecord),
    {
        let mut report = BatchReport::default();
        for (index, peptide) in peptides.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            tracing::info!(
                peptide = %peptide.slug,
                position = index + 1,
                total = peptides.len(),
                "batch item started"
            );

            let run = self.driver.run(peptide).await;
            on_done(index, &run);
            report.entries.push(BatchEntry::from(&run));

            if run.status.is_failure() && !self.continue_on_error {
                tracing::warn!(peptide = %peptide.slug, "stopping batch after failure");
                report.halted_by = Some(peptide.slug.clone());
                break;
            }
        }
        tracing::info!(
            runs = report.entries.len(),
            succeeded = report.count(RunStatus::Succeeded),
            failed = report.count(RunStatus::Failed),
            cost_usd = report.total_cost_usd(),
            "batch finished"
        );
        report
    }

    pub async fn run(&self, peptides: &[PeptideIdentity]) -> BatchReport {
        self.run_with(peptides, |_, _| {}).await
    }
}
