use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pep_config::PepConfig;
use pep_core::{ComplianceMode, PageRecord};
use pep_llm::AnthropicClient;
use pep_pipeline::retry_config;
use pep_synth::{
    CitationAudit, ComplianceGate, ComplianceReport, LlmComplianceAuditor, audit_record,
    quick_check, uncited_studies,
};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::output::output;
use crate::progress::RunProgress;

#[derive(Debug, Serialize)]
struct AuditReport {
    peptide: String,
    citations: CitationAudit,
    uncited_studies: Vec<String>,
    quick: ComplianceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    full: Option<ComplianceReport>,
}

impl AuditReport {
    fn passed(&self) -> bool {
        self.quick.passed && self.full.as_ref().is_none_or(|full| full.passed)
    }
}

/// Handle `pep audit`. The quick tier is local; `--full` calls the provider.
pub async fn handle(
    args: &AuditArgs,
    config: &PepConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let record = read_record(&args.file)?;
    let mut report = local_audit(&record);

    if args.full {
        let llm = config.require_llm()?;
        let client = AnthropicClient::new(llm, retry_config(&config.pipeline))
            .context("failed to initialize text generation client")?;
        let gate = ComplianceGate::new(Some(Arc::new(LlmComplianceAuditor::new(Arc::new(
            client,
        )))));

        let progress = RunProgress::single(&format!(
            "Running full compliance audit for {}",
            record.peptide.slug
        ));
        let full = gate.validate(&record, ComplianceMode::Full).await;
        progress.clear();
        report.full = Some(full.context("full compliance audit failed")?);
    }

    output(&report, flags.format)?;
    if !report.passed() {
        anyhow::bail!("page for '{}' did not pass the audit", report.peptide);
    }
    Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<PageRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a page record", path.display()))
}

fn local_audit(record: &PageRecord) -> AuditReport {
    AuditReport {
        peptide: record.peptide.slug.clone(),
        citations: audit_record(record),
        uncited_studies: uncited_studies(record),
        quick: quick_check(record),
        full: None,
    }
}

#[cfg(test)]
mod tests {
    use pep_core::{
        EvidenceGrade, LiteratureStudy, PageRecord, PeptideIdentity, Section, Study, StudyDesign,
    };
    use pretty_assertions::assert_eq;

    use super::local_audit;

    fn record(section_html: &str) -> PageRecord {
        let study = |id: &str| {
            Study::Literature(LiteratureStudy {
                id: id.into(),
                title: "Gastric lesion healing".into(),
                abstract_text: None,
                authors: vec![],
                journal: "Life Sci".into(),
                year: Some(2016),
                doc_id: None,
                study_design: StudyDesign::AnimalInVivo,
            })
        };
        PageRecord::draft(
            PeptideIdentity::from_name("BPC-157", vec![]).unwrap(),
            EvidenceGrade::VeryLow,
            "<p>Evidence is limited to animal models [PMID:1].</p>".into(),
            vec![Section {
                title: "Animal evidence".into(),
                content_html: section_html.into(),
                plain_summary: None,
                display_order: 0,
            }],
            vec![study("PMID:1"), study("PMID:2")],
        )
    }

    #[test]
    fn reports_uncited_studies() {
        let report = local_audit(&record("<p>Lesions healed faster in rats [PMID:1].</p>"));
        assert_eq!(report.uncited_studies, vec!["PMID:2".to_string()]);
        assert_eq!(report.citations.citation_count, 1);
        assert!(report.full.is_none());
    }

    #[test]
    fn fully_cited_page_lists_no_gaps() {
        let report = local_audit(&record(
            "<p>Lesions healed faster in rats [PMID:1][PMID:2].</p>",
        ));
        assert!(report.uncited_studies.is_empty());
        assert_eq!(report.citations.citation_count, 2);
    }
}
