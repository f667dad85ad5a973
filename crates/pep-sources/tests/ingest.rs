//! Ingestion merge and partial-failure behavior against fake providers.

use std::sync::Mutex;

use async_trait::async_trait;
use pep_core::{LiteratureStudy, PeptideIdentity, RegistryTrial, Study, StudyDesign};
use pep_sources::{LiteratureSource, SourceError, ingest};
use pretty_assertions::assert_eq;

#[derive(Default)]
struct FakeSource {
    fail_articles: bool,
    fail_trials: bool,
    seen_terms: Mutex<Vec<String>>,
}

fn article(id: &str) -> Study {
    Study::Literature(LiteratureStudy {
        id: id.into(),
        title: format!("Article {id}"),
        abstract_text: None,
        authors: vec![],
        journal: String::new(),
        year: Some(2020),
        doc_id: None,
        study_design: StudyDesign::AnimalInVivo,
    })
}

fn trial(id: &str) -> Study {
    Study::Trial(RegistryTrial {
        id: id.into(),
        title: format!("Trial {id}"),
        status: "RECRUITING".into(),
        phase: None,
        conditions: vec!["Pain".into()],
        interventions: vec!["Drug: X".into()],
        enrollment: None,
        start_date: None,
        completion_date: None,
        study_design: StudyDesign::HumanControlledTrial,
    })
}

#[async_trait]
impl LiteratureSource for FakeSource {
    async fn search_articles(&self, terms: &[String]) -> Result<Vec<Study>, SourceError> {
        self.seen_terms.lock().unwrap().extend(terms.iter().cloned());
        if self.fail_articles {
            return Err(SourceError::Api {
                status: 500,
                message: "upstream down".into(),
            });
        }
        Ok(vec![article("PMID:1"), article("PMID:2")])
    }

    async fn search_trials(&self, _terms: &[String]) -> Result<Vec<Study>, SourceError> {
        if self.fail_trials {
            return Err(SourceError::RateLimited { retry_after_secs: 60 });
        }
        Ok(vec![trial("NCT:NCT01")])
    }
}

fn peptide() -> PeptideIdentity {
    PeptideIdentity::new("bpc-157", "BPC-157", vec!["bpc-157".into(), "PL 14736".into()]).unwrap()
}

#[tokio::test]
async fn merges_articles_then_trials() {
    let source = FakeSource::default();
    let outcome = ingest(&source, &peptide()).await.unwrap();

    let ids: Vec<&str> = outcome.studies.iter().map(Study::id).collect();
    assert_eq!(ids, vec!["PMID:1", "PMID:2", "NCT:NCT01"]);
    assert!(!outcome.is_partial());
    assert_eq!(
        *source.seen_terms.lock().unwrap(),
        vec!["BPC-157".to_string(), "PL 14736".to_string()]
    );
}

#[tokio::test]
async fn one_failing_source_yields_partial_results() {
    let source = FakeSource {
        fail_trials: true,
        ..Default::default()
    };
    let outcome = ingest(&source, &peptide()).await.unwrap();

    assert_eq!(outcome.studies.len(), 2);
    assert!(outcome.is_partial());
    assert_eq!(outcome.failures[0].source, "clinical_trials");
    assert!(outcome.failures[0].message.contains("rate limited"));
}

#[tokio::test]
async fn both_failing_is_an_ingest_error() {
    let source = FakeSource {
        fail_articles: true,
        fail_trials: true,
        ..Default::default()
    };
    let err = ingest(&source, &peptide()).await.unwrap_err();

    assert_eq!(err.peptide, "bpc-157");
    assert_eq!(err.failures.len(), 2);
    assert!(err.to_string().contains("europe_pmc: API error (500): upstream down"));
}
