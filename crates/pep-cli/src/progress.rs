//! Stderr progress for page runs. Every method is a no-op when progress is
//! disabled (non-terminal stderr, `--quiet`, or `--verbose`).

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pep_core::{EvidenceGrade, PipelineStep, RunStatus};
use pep_pipeline::RunRecord;

use crate::ui;

pub struct RunProgress {
    bar: Option<ProgressBar>,
}

impl RunProgress {
    /// Spinner for work on one peptide, e.g. `Building page for BPC-157`.
    #[must_use]
    pub fn single(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    /// Bar over a batch of `total` peptides.
    #[must_use]
    pub fn batch(total: usize) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{wide_bar:.cyan/blue} {pos}/{len} peptides {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("starting");
        Self { bar: Some(bar) }
    }

    /// Advance a batch by one finished run and name the next peptide.
    pub fn run_finished(&self, run: &RunRecord, next: Option<&str>) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            bar.set_message(format!("{}, next {}", run_line(run), next.unwrap_or("done")));
        }
    }

    /// Close a single-peptide spinner with the run's outcome. Failed and
    /// not-ready runs stay on screen as abandoned.
    pub fn finish_run(&self, run: &RunRecord) {
        if let Some(bar) = &self.bar {
            let line = run_line(run);
            match run.status {
                RunStatus::Failed | RunStatus::NotReady => bar.abandon_with_message(line),
                RunStatus::Succeeded | RunStatus::Drafted => bar.finish_with_message(line),
            }
        }
    }

    /// Close a spinner after a publish of `slug` at `version`.
    pub fn finish_published(&self, slug: &str, version: u32) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(format!("{slug} v{version} published"));
        }
    }

    /// Close a spinner after `step` failed for `slug`.
    pub fn finish_failed(&self, slug: &str, step: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(format!("{slug} failed at {step}"));
        }
    }

    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn run_line(run: &RunRecord) -> String {
    outcome_line(&run.peptide, run.status, run.failed_step, run.grade)
}

/// One-line outcome: `bpc-157 published (Low)`, `tb-500 failed at synthesize`.
fn outcome_line(
    peptide: &str,
    status: RunStatus,
    failed_step: Option<PipelineStep>,
    grade: Option<EvidenceGrade>,
) -> String {
    let step = failed_step.map_or_else(|| "unknown step".to_string(), |s| s.to_string());
    let graded = |verb: &str| match grade {
        Some(grade) => format!("{peptide} {verb} ({grade})"),
        None => format!("{peptide} {verb}"),
    };
    match status {
        RunStatus::Succeeded => graded("published"),
        RunStatus::Drafted => graded("drafted"),
        RunStatus::NotReady => format!("{peptide} not ready at {step}"),
        RunStatus::Failed => format!("{peptide} failed at {step}"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RunStatus::Succeeded, None, Some(EvidenceGrade::Low), "bpc-157 published (Low)")]
    #[case(RunStatus::Drafted, None, None, "bpc-157 drafted")]
    #[case(
        RunStatus::NotReady,
        Some(PipelineStep::QuickAudit),
        Some(EvidenceGrade::Low),
        "bpc-157 not ready at quick_audit"
    )]
    #[case(RunStatus::Failed, Some(PipelineStep::Ingest), None, "bpc-157 failed at ingest")]
    #[case(RunStatus::Failed, None, None, "bpc-157 failed at unknown step")]
    fn outcome_lines_name_the_step(
        #[case] status: RunStatus,
        #[case] failed_step: Option<PipelineStep>,
        #[case] grade: Option<EvidenceGrade>,
        #[case] expected: &str,
    ) {
        assert_eq!(outcome_line("bpc-157", status, failed_step, grade), expected);
    }

    #[test]
    fn disabled_progress_is_silent() {
        let progress = RunProgress { bar: None };
        progress.finish_published("bpc-157", 2);
        progress.finish_failed("bpc-157", "upload");
        progress.clear();
    }
}
