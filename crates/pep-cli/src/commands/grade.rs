use std::path::Path;

use anyhow::Context;
use pep_core::{EvidenceGrade, Study};
use pep_evidence::{DesignCounts, explain, grade, missing_for_upgrade, normalize};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::GradeArgs;
use crate::output::output;

#[derive(Debug, Serialize)]
struct GradeReport {
    grade: EvidenceGrade,
    studies: usize,
    counts: DesignCounts,
    rationale: String,
    missing_for_upgrade: Vec<String>,
}

/// Handle `pep grade`. Needs no configuration or network.
pub fn handle(args: &GradeArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let studies = read_studies(&args.file)?;
    output(&grade_report(studies), flags.format)
}

fn read_studies(path: &Path) -> anyhow::Result<Vec<Study>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of studies", path.display()))
}

fn grade_report(studies: Vec<Study>) -> GradeReport {
    let studies = normalize(studies);
    GradeReport {
        grade: grade(&studies),
        studies: studies.len(),
        counts: DesignCounts::from_studies(&studies),
        rationale: explain(&studies),
        missing_for_upgrade: missing_for_upgrade(&studies),
    }
}
