//! Structured outcome of one peptide run.

use std::time::{Duration, Instant};

use pep_core::{CostRates, EvidenceGrade, PageRecord, PipelineStep, RunStatus, Usage};
use pep_synth::ComplianceReport;
use serde::Serialize;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepTiming {
    pub step: PipelineStep,
    pub duration_ms: u64,
}

/// Everything a caller needs to know about a run, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub peptide: String,
    pub status: RunStatus,
    /// Step that failed or whose gate did not pass.
    pub failed_step: Option<PipelineStep>,
    /// Kind-tagged error or compliance summary.
    pub error: Option<String>,
    pub timings: Vec<StepTiming>,
    pub duration_ms: u64,
    pub usage: Usage,
    pub cost_usd: f64,
    pub grade: Option<EvidenceGrade>,
    pub study_count: usize,
    /// Sources that failed during a partial ingest.
    pub source_failures: Vec<String>,
    /// Study ids never cited by the generated page.
    pub uncited_studies: Vec<String>,
    pub compliance: Option<ComplianceReport>,
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PageRecord>,
}

impl RunRecord {
    fn new(peptide: &str) -> Self {
        Self {
            peptide: peptide.to_string(),
            status: RunStatus::Failed,
            failed_step: None,
            error: None,
            timings: Vec::new(),
            duration_ms: 0,
            usage: Usage::default(),
            cost_usd: 0.0,
            grade: None,
            study_count: 0,
            source_failures: Vec::new(),
            uncited_studies: Vec::new(),
            compliance: None,
            pdf_url: None,
            record: None,
        }
    }

    #[must_use]
    pub fn timing(&self, step: PipelineStep) -> Option<Duration> {
        self.timings
            .iter()
            .find(|t| t.step == step)
            .map(|t| Duration::from_millis(t.duration_ms))
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Builds a [`RunRecord`] while the driver moves through its steps.
pub(crate) struct RunTracker {
    record: RunRecord,
    rates: CostRates,
    started: Instant,
    step: PipelineStep,
    step_started: Instant,
}

impl RunTracker {
    pub(crate) fn new(peptide: &str, rates: CostRates) -> Self {
        let now = Instant::now();
        Self {
            record: RunRecord::new(peptide),
            rates,
            started: now,
            step: PipelineStep::Ingest,
            step_started: now,
        }
    }

    pub(crate) fn begin(&mut self, step: PipelineStep) {
        self.step = step;
        self.step_started = Instant::now();
        tracing::debug!(step = %step, "step started");
    }

    pub(crate) fn end(&mut self) {
        let elapsed = self.step_started.elapsed();
        tracing::debug!(step = %self.step, elapsed_ms = millis(elapsed), "step finished");
        self.record.timings.push(StepTiming {
            step: self.step,
            duration_ms: millis(elapsed),
        });
    }

    pub(crate) fn add_usage(&mut self, usage: Usage) {
        self.record.usage += usage;
    }

    pub(crate) fn record_mut(&mut self) -> &mut RunRecord {
        &mut self.record
    }

    /// Stop at the current step's gate with a compliance summary.
    pub(crate) fn not_ready(&mut self, reason: String) {
        self.end();
        tracing::warn!(step = %self.step, %reason, "page not ready");
        self.record.failed_step = Some(self.step);
        self.record.error = Some(format!("ComplianceFailure: {reason}"));
    }

    pub(crate) fn fail(mut self, err: &PipelineError) -> RunRecord {
        self.end();
        tracing::warn!(step = %self.step, kind = err.kind(), error = %err, "pipeline step failed");
        self.record.failed_step = Some(self.step);
        self.record.error = Some(err.to_string());
        self.finish(RunStatus::Failed)
    }

    pub(crate) fn finish(mut self, status: RunStatus) -> RunRecord {
        self.record.status = status;
        self.record.duration_ms = millis(self.started.elapsed());
        self.record.cost_usd = self.rates.cost_of(self.record.usage);
        tracing::info!(
            status = %status,
            duration_ms = self.record.duration_ms,
            tokens = self.record.usage.total_tokens(),
            cost_usd = self.record.cost_usd,
            "run finished"
        );
        self.record
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rates() -> CostRates {
        CostRates {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        }
    }

    #[test]
    fn failure_records_step_and_cost_so_far() {
        let mut tracker = RunTracker::new("bpc-157", rates());
        tracker.begin(PipelineStep::Synthesize);
        tracker.add_usage(Usage::new(1_000_000, 0));
        let record = tracker.fail(&PipelineError::Synthesis {
            peptide: "bpc-157".into(),
            message: "SynthesisError body".into(),
            raw_output: None,
        });

        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.failed_step, Some(PipelineStep::Synthesize));
        assert!((record.cost_usd - 3.0).abs() < 1e-9);
        assert!(record.timing(PipelineStep::Synthesize).is_some());
        assert!(record.error.unwrap().starts_with("SynthesisError: "));
    }

    #[test]
    fn not_ready_is_a_gate_outcome() {
        let mut tracker = RunTracker::new("tb-500", rates());
        tracker.begin(PipelineStep::QuickAudit);
        tracker.not_ready("1 blocking issue".into());
        let record = tracker.finish(RunStatus::NotReady);

        assert_eq!(record.status, RunStatus::NotReady);
        assert_eq!(record.failed_step, Some(PipelineStep::QuickAudit));
        assert_eq!(record.error.as_deref(), Some("ComplianceFailure: 1 blocking issue"));
        assert!(record.cost_usd.abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_without_page_body_when_absent() {
        let record = RunTracker::new("ghk-cu", rates()).finish(RunStatus::Drafted);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "drafted");
        assert!(json.get("record").is_none());
    }
}
