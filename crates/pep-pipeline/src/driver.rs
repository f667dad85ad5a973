//! Single-peptide pipeline: ingest → normalize → grade → synthesize → quick
//! audit → full audit → publish.
//!
//! [`PipelineDriver::run`] never returns an error. Failures and compliance
//! gates end the run early and are described by the returned [`RunRecord`].

use std::sync::Arc;

use pep_core::{
    ComplianceMode, CostRates, PageRecord, PeptideIdentity, PipelineStep, RunStatus, StudySet,
};
use pep_evidence::{explain, filter_by_quality, grade, limit_by_category, normalize};
use pep_publish::Publisher;
use pep_sources::LiteratureSource;
use pep_synth::{ComplianceGate, ComplianceReport, Synthesizer, audit_record, uncited_studies};
use tracing::Instrument;

use crate::error::PipelineError;
use crate::record::{RunRecord, RunTracker};
use crate::settings::DriverOptions;

/// Runs every step for one peptide with injected capabilities.
pub struct PipelineDriver {
    source: Arc<dyn LiteratureSource>,
    synthesizer: Synthesizer,
    gate: ComplianceGate,
    publisher: Option<Publisher>,
    options: DriverOptions,
    rates: CostRates,
}

impl PipelineDriver {
    /// A driver that drafts pages without publishing them.
    #[must_use]
    pub fn new(
        source: Arc<dyn LiteratureSource>,
        synthesizer: Synthesizer,
        gate: ComplianceGate,
    ) -> Self {
        Self {
            source,
            synthesizer,
            gate,
            publisher: None,
            options: DriverOptions::default(),
            rates: CostRates::default(),
        }
    }

    #[must_use]
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn with_rates(mut self, rates: CostRates) -> Self {
        self.rates = rates;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Process one peptide end to end.
    pub async fn run(&self, peptide: &PeptideIdentity) -> RunRecord {
        let span = tracing::info_span!("pipeline", peptide = %peptide.slug);
        async {
            tracing::info!(name = %peptide.name, "run started");
            let mut tracker = RunTracker::new(&peptide.slug, self.rates);
            match self.execute(peptide, &mut tracker).await {
                Ok(status) => tracker.finish(status),
                Err(e) => tracker.fail(&e),
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        peptide: &PeptideIdentity,
        tracker: &mut RunTracker,
    ) -> Result<RunStatus, PipelineError> {
        tracker.begin(PipelineStep::Ingest);
        let ingested = pep_sources::ingest(self.source.as_ref(), peptide).await?;
        if ingested.is_partial() {
            tracing::warn!(
                failed = ingested.failures.len(),
                "continuing with partial source results"
            );
        }
        tracker.record_mut().source_failures = ingested
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.source, f.message))
            .collect();
        tracker.end();

        tracker.begin(PipelineStep::Normalize);
        let raw_count = ingested.studies.len();
        let studies = normalize(ingested.studies);
        let studies = filter_by_quality(studies, self.options.min_abstract_chars);
        let studies = limit_by_category(studies, &self.options.limits);
        let set = StudySet::new(peptide.clone(), studies);
        if set.is_empty() {
            return Err(PipelineError::Normalize {
                peptide: peptide.slug.clone(),
                message: format!("no usable studies out of {raw_count} ingested"),
            });
        }
        tracing::info!(raw = raw_count, kept = set.len(), "studies normalized");
        tracker.record_mut().study_count = set.len();
        tracker.end();

        tracker.begin(PipelineStep::Grade);
        let evidence = grade(&set.studies);
        tracing::info!(grade = %evidence, rationale = %explain(&set.studies), "evidence graded");
        tracker.record_mut().grade = Some(evidence);
        tracker.end();

        tracker.begin(PipelineStep::Synthesize);
        let synthesis = self
            .synthesizer
            .synthesize(&set.peptide.name, &set.peptide.aliases, &set.studies, evidence)
            .await?;
        tracker.add_usage(synthesis.usage);
        let mut sections = synthesis.sections;
        if self.options.plain_summaries {
            let usage = self
                .synthesizer
                .add_plain_language_summaries(&mut sections)
                .await;
            tracker.add_usage(usage);
        }
        let page = PageRecord::draft(
            set.peptide,
            evidence,
            synthesis.summary_html,
            sections,
            set.studies,
        );
        tracker.end();

        tracker.begin(PipelineStep::QuickAudit);
        let citations = audit_record(&page);
        let uncited = uncited_studies(&page);
        tracing::debug!(
            citations = citations.citation_count,
            missing_claims = citations.missing_claims.len(),
            uncited = uncited.len(),
            "citations audited"
        );
        tracker.record_mut().uncited_studies.clone_from(&uncited);
        if !uncited.is_empty() {
            if self.options.require_citation_completeness {
                let reason = format!("studies never cited: {}", uncited.join(", "));
                return Ok(stop_not_ready(tracker, page, reason));
            }
            tracing::warn!(uncited = %uncited.join(", "), "some studies are never cited");
        }
        let quick = self
            .gate
            .validate(&page, ComplianceMode::Quick)
            .await
            .map_err(|e| PipelineError::audit(&page.peptide.slug, &e))?;
        let passed = quick.passed;
        let summary = gate_reason(&quick);
        tracker.record_mut().compliance = Some(quick);
        if !passed {
            return Ok(stop_not_ready(tracker, page, summary));
        }
        tracker.end();

        if self.options.full_audit {
            tracker.begin(PipelineStep::FullAudit);
            let full = self
                .gate
                .validate(&page, ComplianceMode::Full)
                .await
                .map_err(|e| PipelineError::audit(&page.peptide.slug, &e))?;
            tracker.add_usage(full.usage);
            let passed = full.passed;
            let summary = gate_reason(&full);
            tracker.record_mut().compliance = Some(full);
            if !passed {
                return Ok(stop_not_ready(tracker, page, summary));
            }
            tracker.end();
        }

        let Some(publisher) = &self.publisher else {
            tracing::info!("publish skipped, page drafted");
            tracker.record_mut().record = Some(page);
            return Ok(RunStatus::Drafted);
        };

        tracker.begin(PipelineStep::Publish);
        let outcome = publisher.publish(page).await?;
        let record = tracker.record_mut();
        record.pdf_url = Some(outcome.pdf_url);
        record.record = Some(outcome.record);
        tracker.end();
        Ok(RunStatus::Succeeded)
    }
}

fn stop_not_ready(tracker: &mut RunTracker, page: PageRecord, reason: String) -> RunStatus {
    tracker.not_ready(reason);
    tracker.record_mut().record = Some(page);
    RunStatus::NotReady
}

fn gate_reason(report: &ComplianceReport) -> String {
    let summary = report.blocking_summary();
    if summary.is_empty() {
        format!("{} audit did not pass (score {})", report.mode, report.score)
    } else {
        summary
    }
}
