//! Synthesis, citation audit and compliance against a scripted generator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pep_core::{
    ComplianceMode, EvidenceGrade, LiteratureStudy, PageRecord, PeptideIdentity, Study,
    StudyDesign, Usage,
};
use pep_llm::{Generation, GenerationRequest, LlmError, TextGenerator};
use pep_synth::{
    ComplianceGate, LlmComplianceAuditor, SynthesisError, Synthesizer, audit_record,
    uncited_studies,
};
use pretty_assertions::assert_eq;

/// Returns queued responses in order and records every request.
#[derive(Default)]
struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Generation, LlmError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn with(responses: Vec<Result<Generation, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        })
    }
}

fn text(body: &str, input: u64, output: u64) -> Result<Generation, LlmError> {
    Ok(Generation {
        text: body.to_string(),
        usage: Usage::new(input, output),
    })
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Parse("script exhausted".into())))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn article(id: &str) -> Study {
    Study::Literature(LiteratureStudy {
        id: id.into(),
        title: format!("Rodent study {id}"),
        abstract_text: Some("Rats received the peptide and tendon healing was measured.".into()),
        authors: vec!["Sikiric P".into()],
        journal: "J Physiol Pharmacol".into(),
        year: Some(2019),
        doc_id: None,
        study_design: StudyDesign::AnimalInVivo,
    })
}

const PAGE_HTML: &str = "<p>BPC-157 has been studied mainly in rodents [PMID:1][PMID:2].</p>\n\
<h2>Animal evidence</h2>\n<p>Rat studies reported improved tendon healing [PMID:1] and reduced lesion size [PMID:2].</p>\n\
<h2>Safety and unknowns</h2>\n<p>No human safety data exist [PMID:2].</p>";

#[tokio::test]
async fn synthesized_page_cites_every_study() {
    let generator = ScriptedGenerator::with(vec![text(PAGE_HTML, 900, 300)]);
    let synthesizer = Synthesizer::new(generator.clone());
    let studies = vec![article("PMID:1"), article("PMID:2")];

    let synthesis = synthesizer
        .synthesize("BPC-157", &[], &studies, EvidenceGrade::VeryLow)
        .await
        .unwrap();
    assert_eq!(synthesis.usage, Usage::new(900, 300));
    assert_eq!(synthesis.sections.len(), 2);

    let record = PageRecord::draft(
        PeptideIdentity::from_name("BPC-157", vec![]).unwrap(),
        EvidenceGrade::VeryLow,
        synthesis.summary_html,
        synthesis.sections,
        studies,
    );
    let audit = audit_record(&record);
    assert!(audit.passed(), "{:?}", audit.missing_claims);
    assert_eq!(audit.citation_count, 2);
    assert!(audit.cited_ids.contains("PMID:1") && audit.cited_ids.contains("PMID:2"));
    assert!(uncited_studies(&record).is_empty());

    let prompt = &generator.requests.lock().unwrap()[0].prompt;
    assert!(prompt.contains("[PMID:1]"));
    assert!(prompt.contains("[PMID:2]"));
}

#[tokio::test]
async fn uncited_study_is_detected() {
    let generator = ScriptedGenerator::with(vec![text(PAGE_HTML, 1, 1)]);
    let synthesizer = Synthesizer::new(generator);
    let studies = vec![article("PMID:1"), article("PMID:2"), article("PMID:3")];

    let synthesis = synthesizer
        .synthesize("BPC-157", &[], &studies, EvidenceGrade::VeryLow)
        .await
        .unwrap();
    let record = PageRecord::draft(
        PeptideIdentity::from_name("BPC-157", vec![]).unwrap(),
        EvidenceGrade::VeryLow,
        synthesis.summary_html,
        synthesis.sections,
        studies,
    );
    assert_eq!(uncited_studies(&record), vec!["PMID:3".to_string()]);
}

#[tokio::test]
async fn empty_output_is_unusable_and_keeps_raw_text() {
    let generator = ScriptedGenerator::with(vec![text("```html\n```", 10, 2)]);
    let synthesizer = Synthesizer::new(generator);

    let err = synthesizer
        .synthesize("BPC-157", &[], &[article("PMID:1")], EvidenceGrade::VeryLow)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Unusable { .. }));
    assert_eq!(err.raw_output(), Some("```html\n```"));
    assert_eq!(err.peptide(), "BPC-157");
}

#[tokio::test]
async fn provider_failure_is_a_generation_error() {
    let generator = ScriptedGenerator::with(vec![Err(LlmError::Api {
        status: 401,
        message: "invalid x-api-key".into(),
    })]);
    let err = Synthesizer::new(generator)
        .synthesize("TB-500", &[], &[], EvidenceGrade::VeryLow)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Generation { .. }));
    assert!(err.raw_output().is_none());
}

#[tokio::test]
async fn lay_summary_failures_leave_sections_untouched() {
    let generator = ScriptedGenerator::with(vec![
        text(PAGE_HTML, 900, 300),
        text("Rats healed faster in these studies.", 50, 20),
        Err(LlmError::RateLimited { retry_after_secs: 1 }),
    ]);
    let synthesizer = Synthesizer::new(generator.clone());
    let mut synthesis = synthesizer
        .synthesize("BPC-157", &[], &[article("PMID:1")], EvidenceGrade::VeryLow)
        .await
        .unwrap();

    let usage = synthesizer
        .add_plain_language_summaries(&mut synthesis.sections)
        .await;
    assert_eq!(usage, Usage::new(50, 20));
    assert_eq!(
        synthesis.sections[0].plain_summary.as_deref(),
        Some("Rats healed faster in these studies.")
    );
    assert_eq!(synthesis.sections[1].plain_summary, None);

    let lay_prompt = &generator.requests.lock().unwrap()[1].prompt;
    assert!(!lay_prompt.contains("[PMID"));
}

#[tokio::test]
async fn full_audit_runs_through_the_generator() {
    let verdict = r#"Review complete.
```json
{"passed": true, "score": 94, "issues": [{"rule": "safety_disclosure", "severity": "warning", "message": "thin safety section"}], "fixed_text": null}
```"#;
    let generator = ScriptedGenerator::with(vec![text(verdict, 2000, 150)]);
    let gate = ComplianceGate::new(Some(Arc::new(LlmComplianceAuditor::new(generator.clone()))));

    let record = PageRecord::draft(
        PeptideIdentity::from_name("BPC-157", vec![]).unwrap(),
        EvidenceGrade::VeryLow,
        "<p>Summary [PMID:1].</p>".into(),
        vec![],
        vec![article("PMID:1")],
    );
    let report = gate.validate(&record, ComplianceMode::Full).await.unwrap();
    assert!(report.passed);
    assert_eq!(report.score, 94);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.usage, Usage::new(2000, 150));

    let request = &generator.requests.lock().unwrap()[0];
    assert!(request.prompt.contains("1. A disclaimer states"));
    assert!(request.prompt.contains("not medical advice"));
}
