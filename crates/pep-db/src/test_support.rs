//! Shared fixtures for pep-db unit tests.

use chrono::{SubsecRound, Utc};
use pep_core::{
    EvidenceGrade, LiteratureStudy, PageRecord, PeptideIdentity, RegistryTrial, Section, Study,
    StudyDesign,
};

use crate::PageDb;

pub async fn test_db() -> PageDb {
    PageDb::open_local(":memory:").await.unwrap()
}

pub fn sample_studies() -> Vec<Study> {
    vec![
        Study::Trial(RegistryTrial {
            id: "NCT:NCT02637284".into(),
            title: "BPC-157 in ulcerative colitis".into(),
            status: "COMPLETED".into(),
            phase: Some("PHASE2".into()),
            conditions: vec!["Ulcerative Colitis".into()],
            interventions: vec!["Drug: BPC-157".into()],
            enrollment: Some(40),
            start_date: Some("2015-06".into()),
            completion_date: None,
            study_design: StudyDesign::HumanControlledTrial,
        }),
        Study::Literature(LiteratureStudy {
            id: "PMID:1".into(),
            title: "Tendon healing in rats".into(),
            abstract_text: Some("Rats were treated and tendon healing was assessed.".into()),
            authors: vec!["Sikiric P".into()],
            journal: "J Orthop Res".into(),
            year: Some(2011),
            doc_id: Some("10.1002/jor.21107".into()),
            study_design: StudyDesign::AnimalInVivo,
        }),
    ]
}

/// A draft record with millisecond-precision `last_updated`, matching storage.
pub fn sample_record(slug: &str) -> PageRecord {
    let peptide = PeptideIdentity::new(slug, slug.to_uppercase(), vec!["alias".into()]).unwrap();
    let mut record = PageRecord::draft(
        peptide,
        EvidenceGrade::Moderate,
        "<p>Summary [PMID:1][NCT:NCT02637284].</p>".into(),
        vec![
            Section {
                title: "Human evidence".into(),
                content_html: "<p>One trial [NCT:NCT02637284].</p>".into(),
                plain_summary: Some("One small human trial exists.".into()),
                display_order: 0,
            },
            Section {
                title: "Animal evidence".into(),
                content_html: "<p>Rodent work [PMID:1].</p>".into(),
                plain_summary: None,
                display_order: 1,
            },
        ],
        sample_studies(),
    );
    record.last_updated = Utc::now().trunc_subsecs(3);
    record
}
