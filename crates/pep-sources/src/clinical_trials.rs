//! ClinicalTrials.gov API v2 client.

use pep_core::{RegistryTrial, Study};
use pep_evidence::{TrialDesignInfo, infer_trial_design};

use crate::{
    SourceClient,
    error::SourceError,
    http::{check_response, with_retry},
};

pub const SOURCE: &str = "clinical_trials";

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudiesResponse {
    #[serde(default)]
    studies: Vec<StudyRecord>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudyRecord {
    protocol_section: ProtocolSection,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolSection {
    identification_module: IdentificationModule,
    #[serde(default)]
    status_module: Option<StatusModule>,
    #[serde(default)]
    design_module: Option<DesignModule>,
    #[serde(default)]
    conditions_module: Option<ConditionsModule>,
    #[serde(default)]
    arms_interventions_module: Option<ArmsInterventionsModule>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationModule {
    nct_id: String,
    #[serde(default)]
    brief_title: Option<String>,
    #[serde(default)]
    official_title: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusModule {
    #[serde(default)]
    overall_status: Option<String>,
    #[serde(default)]
    start_date_struct: Option<DateStruct>,
    #[serde(default)]
    completion_date_struct: Option<DateStruct>,
}

#[derive(serde::Deserialize)]
struct DateStruct {
    date: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignModule {
    #[serde(default)]
    study_type: Option<String>,
    #[serde(default)]
    phases: Vec<String>,
    #[serde(default)]
    enrollment_info: Option<EnrollmentInfo>,
    #[serde(default)]
    design_info: Option<DesignInfo>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignInfo {
    #[serde(default)]
    allocation: Option<String>,
    #[serde(default)]
    intervention_model: Option<String>,
}

#[derive(serde::Deserialize)]
struct EnrollmentInfo {
    #[serde(default)]
    count: Option<u32>,
}

#[derive(serde::Deserialize)]
struct ConditionsModule {
    #[serde(default)]
    conditions: Vec<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmsInterventionsModule {
    #[serde(default)]
    arm_groups: Vec<ArmGroup>,
    #[serde(default)]
    interventions: Vec<Intervention>,
}

#[derive(serde::Deserialize)]
struct ArmGroup {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl ArmGroup {
    /// `PLACEBO_COMPARATOR`, `ACTIVE_COMPARATOR`, `SHAM_COMPARATOR`, `NO_INTERVENTION`.
    fn is_comparator(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| {
            let k = k.to_ascii_uppercase();
            k.ends_with("_COMPARATOR") || k == "NO_INTERVENTION"
        })
    }
}

#[derive(serde::Deserialize)]
struct Intervention {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    name: String,
}

impl SourceClient {
    /// Search ClinicalTrials.gov for trials matching any of `terms`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if a page request fails after retries or a
    /// response cannot be parsed.
    pub async fn search_clinical_trials(&self, terms: &[String]) -> Result<Vec<Study>, SourceError> {
        let query = crate::europe_pmc::build_query(terms);
        let max = self.settings.max_results as usize;
        let mut page_token: Option<String> = None;
        let mut studies = Vec::new();

        loop {
            let mut url = format!(
                "{}/studies?query.term={}&pageSize={}&format=json",
                self.settings.clinical_trials_url.trim_end_matches('/'),
                urlencoding::encode(&query),
                self.settings.page_size,
            );
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(token));
            }
            let url = url.as_str();
            let page: StudiesResponse = with_retry(&self.retry, SOURCE, || async move {
                let resp = check_response(self.http.get(url).send().await?).await?;
                let body = resp.text().await?;
                serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))
            })
            .await?;

            let fetched = page.studies.len();
            studies.extend(page.studies.into_iter().map(map_record));
            tracing::debug!(source = SOURCE, fetched, total = studies.len(), "page fetched");

            match page.next_page_token {
                Some(token) if fetched > 0 && studies.len() < max => {
                    page_token = Some(token);
                    self.throttle().await;
                }
                _ => break,
            }
        }

        studies.truncate(max);
        Ok(studies)
    }
}

fn map_record(record: StudyRecord) -> Study {
    let p = record.protocol_section;
    let status = p.status_module;
    let design = p.design_module;
    let design_info = design.as_ref().and_then(|d| d.design_info.as_ref());
    let has_comparator_arm = p
        .arms_interventions_module
        .as_ref()
        .is_some_and(|m| m.arm_groups.iter().any(ArmGroup::is_comparator));
    let study_design = infer_trial_design(&TrialDesignInfo {
        study_type: design.as_ref().and_then(|d| d.study_type.as_deref()),
        allocation: design_info.and_then(|i| i.allocation.as_deref()),
        intervention_model: design_info.and_then(|i| i.intervention_model.as_deref()),
        has_comparator_arm,
    });
    let phase = design
        .as_ref()
        .map(|d| d.phases.join("/"))
        .filter(|s| !s.is_empty());
    let interventions: Vec<String> = p
        .arms_interventions_module
        .map(|m| {
            m.interventions
                .into_iter()
                .map(|i| match i.kind {
                    Some(kind) => format!("{}: {}", title_case(&kind), i.name),
                    None => i.name,
                })
                .collect()
        })
        .unwrap_or_default();

    Study::Trial(RegistryTrial {
        id: format!("NCT:{}", p.identification_module.nct_id),
        title: p
            .identification_module
            .brief_title
            .or(p.identification_module.official_title)
            .unwrap_or_default(),
        status: status
            .as_ref()
            .and_then(|s| s.overall_status.clone())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        phase,
        conditions: p.conditions_module.map(|c| c.conditions).unwrap_or_default(),
        interventions,
        enrollment: design
            .as_ref()
            .and_then(|d| d.enrollment_info.as_ref())
            .and_then(|e| e.count),
        start_date: status
            .as_ref()
            .and_then(|s| s.start_date_struct.as_ref())
            .map(|d| d.date.clone()),
        completion_date: status
            .as_ref()
            .and_then(|s| s.completion_date_struct.as_ref())
            .map(|d| d.date.clone()),
        study_design,
    })
}

/// `DIETARY_SUPPLEMENT` -> `Dietary supplement`.
fn title_case(raw: &str) -> String {
    let lower = raw.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use pep_core::StudyDesign;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const FIXTURE: &str = r#"{
        "studies": [
            {
                "protocolSection": {
                    "identificationModule": {
                        "nctId": "NCT02637284",
                        "briefTitle": "Safety and Pharmacokinetics of BPC 157"
                    },
                    "statusModule": {
                        "overallStatus": "COMPLETED",
                        "startDateStruct": {"date": "2015-06", "type": "ACTUAL"},
                        "completionDateStruct": {"date": "2016-02-10"}
                    },
                    "designModule": {
                        "studyType": "INTERVENTIONAL",
                        "phases": ["PHASE1"],
                        "designInfo": {
                            "allocation": "RANDOMIZED",
                            "interventionModel": "PARALLEL",
                            "primaryPurpose": "TREATMENT"
                        },
                        "enrollmentInfo": {"count": 42, "type": "ACTUAL"}
                    },
                    "conditionsModule": {"conditions": ["Inflammatory Bowel Disease"]},
                    "armsInterventionsModule": {
                        "armGroups": [
                            {"label": "Active", "type": "EXPERIMENTAL"},
                            {"label": "Placebo", "type": "PLACEBO_COMPARATOR"}
                        ],
                        "interventions": [
                            {"type": "DRUG", "name": "PCO-02"},
                            {"type": "DIETARY_SUPPLEMENT", "name": "Placebo"}
                        ]
                    }
                }
            },
            {
                "protocolSection": {
                    "identificationModule": {"nctId": "NCT09999999"},
                    "designModule": {"studyType": "OBSERVATIONAL"}
                }
            }
        ],
        "nextPageToken": "ZVNj7o2Elu8o3lpoWsk"
    }"#;

    #[test]
    fn parses_studies_response() {
        let data: StudiesResponse = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(data.studies.len(), 2);
        assert_eq!(data.next_page_token.as_deref(), Some("ZVNj7o2Elu8o3lpoWsk"));
    }

    #[test]
    fn maps_full_record() {
        let data: StudiesResponse = serde_json::from_str(FIXTURE).unwrap();
        let studies: Vec<Study> = data.studies.into_iter().map(map_record).collect();

        let Study::Trial(trial) = &studies[0] else {
            panic!("expected trial");
        };
        assert_eq!(trial.id, "NCT:NCT02637284");
        assert_eq!(trial.status, "COMPLETED");
        assert_eq!(trial.phase.as_deref(), Some("PHASE1"));
        assert_eq!(trial.enrollment, Some(42));
        assert_eq!(trial.conditions, vec!["Inflammatory Bowel Disease"]);
        assert_eq!(
            trial.interventions,
            vec!["Drug: PCO-02", "Dietary supplement: Placebo"]
        );
        assert_eq!(trial.study_design, StudyDesign::HumanControlledTrial);
        assert_eq!(studies[0].year(), Some(2015));
    }

    #[test]
    fn maps_sparse_record() {
        let data: StudiesResponse = serde_json::from_str(FIXTURE).unwrap();
        let study = data.studies.into_iter().nth(1).map(map_record).unwrap();
        let Study::Trial(trial) = study else {
            panic!("expected trial");
        };
        assert_eq!(trial.status, "UNKNOWN");
        assert!(trial.title.is_empty());
        assert!(trial.phase.is_none());
        assert!(trial.conditions.is_empty());
        assert_eq!(trial.study_design, StudyDesign::HumanObservational);
    }

    fn design_of(design_module: &str, arms_module: &str) -> StudyDesign {
        let json = format!(
            r#"{{"protocolSection": {{
                "identificationModule": {{"nctId": "NCT01000000"}},
                "designModule": {design_module},
                "armsInterventionsModule": {arms_module}
            }}}}"#
        );
        let record: StudyRecord = serde_json::from_str(&json).unwrap();
        map_record(record).design()
    }

    #[rstest]
    #[case("RANDOMIZED", "PARALLEL", "EXPERIMENTAL", StudyDesign::HumanControlledTrial)]
    #[case("NON_RANDOMIZED", "PARALLEL", "ACTIVE_COMPARATOR", StudyDesign::HumanControlledTrial)]
    #[case("NON_RANDOMIZED", "SEQUENTIAL", "EXPERIMENTAL", StudyDesign::HumanObservational)]
    #[case("NA", "SINGLE_GROUP", "EXPERIMENTAL", StudyDesign::HumanObservational)]
    fn maps_allocation_to_design(
        #[case] allocation: &str,
        #[case] model: &str,
        #[case] arm_type: &str,
        #[case] expected: StudyDesign,
    ) {
        let design_module = format!(
            r#"{{"studyType": "INTERVENTIONAL",
                "designInfo": {{"allocation": "{allocation}", "interventionModel": "{model}"}}}}"#
        );
        let arms_module = format!(r#"{{"armGroups": [{{"type": "{arm_type}"}}]}}"#);
        assert_eq!(design_of(&design_module, &arms_module), expected);
    }

    #[test]
    fn interventional_without_design_info_is_not_controlled() {
        assert_eq!(
            design_of(r#"{"studyType": "INTERVENTIONAL"}"#, "{}"),
            StudyDesign::HumanObservational
        );
    }
}
