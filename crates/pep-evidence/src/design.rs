//! Study design inference.
//!
//! Article designs are inferred from publication types first, then from
//! keyword markers in the title and abstract. Trial designs come from the
//! registry's declared study type, allocation, and arm layout. When nothing matches, an article is
//! placed in the weakest tier (`animal_in_vitro`) so that an unclassified
//! paper can never inflate the grade.

use std::sync::LazyLock;

use pep_core::StudyDesign;
use regex::Regex;

static CASE_REPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(case reports?|case study|a case of|case series)\b")
        .expect("valid case report regex")
});

static CONTROLLED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(randomi[sz]ed|placebo[- ]controlled|double[- ]blind(ed)?|controlled (clinical )?trial|crossover trial)\b",
    )
    .expect("valid controlled trial regex")
});

static ANIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(mice|mouse|murine|rats?|rodents?|rabbits?|porcine|pigs?|piglets?|canine|dogs?|zebrafish|primates?|monkeys?|animal models?|in vivo)\b",
    )
    .expect("valid animal regex")
});

static IN_VITRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(in vitro|cell lines?|cell cultures?|cultured|explants?|hek293|keratinocytes|fibroblasts)\b")
        .expect("valid in vitro regex")
});

static HUMAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(cohort|cross[- ]sectional|case[- ]control|observational|retrospective|prospective|patients|participants|volunteers|healthy subjects|women|men)\b",
    )
    .expect("valid human regex")
});

/// Infer the design of a literature article.
///
/// `publication_types` are the source's own labels (e.g. PubMed's
/// `"Randomized Controlled Trial"`, `"Case Reports"`) and are checked first.
#[must_use]
pub fn infer_literature_design(
    title: &str,
    abstract_text: Option<&str>,
    publication_types: &[String],
) -> StudyDesign {
    let pub_types = publication_types.join(" ").to_ascii_lowercase();
    if pub_types.contains("case report") {
        return StudyDesign::HumanCaseReport;
    }

    let text = format!("{title} {}", abstract_text.unwrap_or_default());
    let animal = ANIMAL_RE.is_match(&text);

    if !animal
        && (pub_types.contains("randomized controlled trial")
            || pub_types.contains("controlled clinical trial"))
    {
        return StudyDesign::HumanControlledTrial;
    }
    if CASE_REPORT_RE.is_match(&text) && !animal {
        return StudyDesign::HumanCaseReport;
    }
    if CONTROLLED_RE.is_match(&text) && !animal {
        return StudyDesign::HumanControlledTrial;
    }
    if animal {
        return StudyDesign::AnimalInVivo;
    }
    if IN_VITRO_RE.is_match(&text) {
        return StudyDesign::AnimalInVitro;
    }
    if pub_types.contains("observational study") || HUMAN_RE.is_match(&text) {
        return StudyDesign::HumanObservational;
    }
    StudyDesign::AnimalInVitro
}

/// Design fields a trial registry declares for one study.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrialDesignInfo<'a> {
    /// `INTERVENTIONAL`, `OBSERVATIONAL`, `EXPANDED_ACCESS`.
    pub study_type: Option<&'a str>,
    /// `RANDOMIZED`, `NON_RANDOMIZED`, `NA`.
    pub allocation: Option<&'a str>,
    /// `SINGLE_GROUP`, `PARALLEL`, `CROSSOVER`, `FACTORIAL`, `SEQUENTIAL`.
    pub intervention_model: Option<&'a str>,
    /// At least one arm is a placebo, sham, active, or no-intervention
    /// comparator.
    pub has_comparator_arm: bool,
}

impl<'a> TrialDesignInfo<'a> {
    #[must_use]
    pub const fn of_type(study_type: &'a str) -> Self {
        Self {
            study_type: Some(study_type),
            allocation: None,
            intervention_model: None,
            has_comparator_arm: false,
        }
    }
}

/// Infer the design of a registry trial.
///
/// An interventional trial counts as controlled only when it is randomized,
/// or when a non-randomized multi-arm design includes a comparator arm.
/// Single-arm and unallocated interventional trials are observational.
/// `EXPANDED_ACCESS` is a case report; anything else is observational
/// because registry records always describe human subjects.
#[must_use]
pub fn infer_trial_design(info: &TrialDesignInfo<'_>) -> StudyDesign {
    let upper = |v: Option<&str>| v.map(str::to_ascii_uppercase);
    match upper(info.study_type).as_deref() {
        Some("INTERVENTIONAL") => {
            let multi_arm = matches!(
                upper(info.intervention_model).as_deref(),
                Some("PARALLEL" | "CROSSOVER" | "FACTORIAL")
            );
            match upper(info.allocation).as_deref() {
                Some("RANDOMIZED") => StudyDesign::HumanControlledTrial,
                Some("NON_RANDOMIZED") if multi_arm && info.has_comparator_arm => {
                    StudyDesign::HumanControlledTrial
                }
                _ => StudyDesign::HumanObservational,
            }
        }
        Some("EXPANDED_ACCESS") => StudyDesign::HumanCaseReport,
        _ => StudyDesign::HumanObservational,
    }
}
