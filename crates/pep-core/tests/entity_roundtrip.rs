//! Wire-shape and derived-field tests for entity types.

use pep_core::entities::*;
use pep_core::enums::*;
use pretty_assertions::assert_eq;

fn article(id: &str, design: StudyDesign) -> Study {
    Study::Literature(LiteratureStudy {
        id: id.into(),
        title: format!("Article {id}"),
        abstract_text: Some("An abstract.".into()),
        authors: vec!["Doe J".into()],
        journal: "J Pept Sci".into(),
        year: Some(2021),
        doc_id: None,
        study_design: design,
    })
}

fn trial(id: &str, start: Option<&str>) -> Study {
    Study::Trial(RegistryTrial {
        id: id.into(),
        title: format!("Trial {id}"),
        status: "COMPLETED".into(),
        phase: Some("PHASE2".into()),
        conditions: vec!["Tendinopathy".into()],
        interventions: vec!["Drug: peptide".into()],
        enrollment: Some(40),
        start_date: start.map(str::to_string),
        completion_date: None,
        study_design: StudyDesign::HumanControlledTrial,
    })
}

#[test]
fn study_serializes_with_kind_tag() {
    let json = serde_json::to_value(article("PMID:1", StudyDesign::AnimalInVivo)).unwrap();
    assert_eq!(json["kind"], "literature");
    assert_eq!(json["study_design"], "animal_in_vivo");

    let json = serde_json::to_value(trial("NCT:NCT00000001", Some("2018-03"))).unwrap();
    assert_eq!(json["kind"], "trial");
    assert_eq!(json["conditions"][0], "Tendinopathy");
}

#[test]
fn study_deserializes_with_missing_optional_fields() {
    let raw = r#"{
        "kind": "literature",
        "id": "PMID:77",
        "title": "Sparse record",
        "study_design": "human_case_report"
    }"#;
    let study: Study = serde_json::from_str(raw).unwrap();
    assert_eq!(study.id(), "PMID:77");
    assert_eq!(study.design(), StudyDesign::HumanCaseReport);
    assert_eq!(study.year(), None);
    assert_eq!(study.kind(), "literature");
}

#[test]
fn trial_year_comes_from_start_date() {
    assert_eq!(trial("NCT:NCT1", Some("2016-11-02")).year(), Some(2016));
    assert_eq!(trial("NCT:NCT2", Some("not a date")).year(), None);
    assert_eq!(trial("NCT:NCT3", None).year(), None);
}

#[test]
fn page_draft_computes_counts_and_disclaimers() {
    let peptide = PeptideIdentity::from_name("BPC-157", vec![]).unwrap();
    let studies = vec![
        trial("NCT:NCT1", Some("2019")),
        article("PMID:1", StudyDesign::AnimalInVivo),
        article("PMID:2", StudyDesign::AnimalInVitro),
        article("PMID:3", StudyDesign::HumanObservational),
    ];
    let page = PageRecord::draft(
        peptide,
        EvidenceGrade::Moderate,
        "<p>Summary [NCT:NCT1].</p>".into(),
        vec![Section {
            title: "Animal evidence".into(),
            content_html: "<p>Rodents [PMID:1] [PMID:2].</p>".into(),
            plain_summary: None,
            display_order: 0,
        }],
        studies,
    );

    assert_eq!(page.human_controlled_count, 1);
    assert_eq!(page.animal_count, 2);
    assert_eq!(page.study_count(), 4);
    assert_eq!(page.version, 0);
    assert_eq!(page.disclaimers.len(), DISCLAIMERS.len());
    assert!(page.full_html().contains("[PMID:2]"));
    assert!(page.audit_text().contains("not medical advice"));
}

#[test]
fn page_record_json_roundtrip_preserves_sections() {
    let peptide = PeptideIdentity::new("ghk-cu", "GHK-Cu", vec!["copper peptide".into()]).unwrap();
    let page = PageRecord::draft(
        peptide,
        EvidenceGrade::Low,
        "<p>s</p>".into(),
        vec![
            Section {
                title: "Overview".into(),
                content_html: "<p>a</p>".into(),
                plain_summary: Some("Plain.".into()),
                display_order: 0,
            },
            Section {
                title: "Safety".into(),
                content_html: "<p>b</p>".into(),
                plain_summary: None,
                display_order: 1,
            },
        ],
        vec![article("PMID:9", StudyDesign::AnimalInVitro)],
    );
    let json = serde_json::to_string(&page).unwrap();
    let back: PageRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, page);
}
