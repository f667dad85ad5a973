//! Deterministic evidence grading.
//!
//! Rules, checked in order:
//!
//! | Grade      | Condition                                              |
//! |------------|--------------------------------------------------------|
//! | `high`     | ≥ 3 human controlled trials                            |
//! | `moderate` | ≥ 1 human controlled trial, or ≥ 3 human observational |
//! | `low`      | ≥ 5 animal studies (in vivo + in vitro)                |
//! | `very_low` | otherwise                                              |
//!
//! The grade depends only on design counts, never on study order.

use pep_core::{EvidenceGrade, Study, StudyDesign};
use serde::{Deserialize, Serialize};

pub const HIGH_CONTROLLED_MIN: u32 = 3;
pub const MODERATE_CONTROLLED_MIN: u32 = 1;
pub const MODERATE_OBSERVATIONAL_MIN: u32 = 3;
pub const LOW_ANIMAL_MIN: u32 = 5;

/// Study counts per design tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignCounts {
    pub human_controlled: u32,
    pub human_observational: u32,
    pub human_case_report: u32,
    pub animal_in_vivo: u32,
    pub animal_in_vitro: u32,
}

impl DesignCounts {
    #[must_use]
    pub fn from_studies(studies: &[Study]) -> Self {
        let mut counts = Self::default();
        for study in studies {
            counts.add(study.design());
        }
        counts
    }

    pub const fn add(&mut self, design: StudyDesign) {
        match design {
            StudyDesign::HumanControlledTrial => self.human_controlled += 1,
            StudyDesign::HumanObservational => self.human_observational += 1,
            StudyDesign::HumanCaseReport => self.human_case_report += 1,
            StudyDesign::AnimalInVivo => self.animal_in_vivo += 1,
            StudyDesign::AnimalInVitro => self.animal_in_vitro += 1,
        }
    }

    #[must_use]
    pub const fn animal(&self) -> u32 {
        self.animal_in_vivo + self.animal_in_vitro
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.human_controlled + self.human_observational + self.human_case_report + self.animal()
    }

    /// Apply the grading rules to these counts.
    #[must_use]
    pub const fn grade(&self) -> EvidenceGrade {
        if self.human_controlled >= HIGH_CONTROLLED_MIN {
            EvidenceGrade::High
        } else if self.human_controlled >= MODERATE_CONTROLLED_MIN
            || self.human_observational >= MODERATE_OBSERVATIONAL_MIN
        {
            EvidenceGrade::Moderate
        } else if self.animal() >= LOW_ANIMAL_MIN {
            EvidenceGrade::Low
        } else {
            EvidenceGrade::VeryLow
        }
    }
}

/// Grade a study set.
#[must_use]
pub fn grade(studies: &[Study]) -> EvidenceGrade {
    DesignCounts::from_studies(studies).grade()
}

/// Operator-facing rationale for the grade of `studies`.
#[must_use]
pub fn explain(studies: &[Study]) -> String {
    let counts = DesignCounts::from_studies(studies);
    let grade = counts.grade();
    let reason = match grade {
        EvidenceGrade::High => format!(
            "{} human controlled trials (at least {HIGH_CONTROLLED_MIN} required)",
            counts.human_controlled
        ),
        EvidenceGrade::Moderate if counts.human_controlled >= MODERATE_CONTROLLED_MIN => format!(
            "{} human controlled {} (high requires {HIGH_CONTROLLED_MIN})",
            counts.human_controlled,
            plural(counts.human_controlled, "trial", "trials")
        ),
        EvidenceGrade::Moderate => format!(
            "{} human observational studies and no controlled trials",
            counts.human_observational
        ),
        EvidenceGrade::Low => format!(
            "no qualifying human evidence; {} animal or laboratory studies (at least {LOW_ANIMAL_MIN} required)",
            counts.animal()
        ),
        EvidenceGrade::VeryLow => "no qualifying human evidence and too few animal studies".to_string(),
    };
    format!(
        "Grade {}: {reason}. Counts: {} controlled, {} observational, {} case reports, {} in vivo, {} in vitro.",
        grade.label(),
        counts.human_controlled,
        counts.human_observational,
        counts.human_case_report,
        counts.animal_in_vivo,
        counts.animal_in_vitro,
    )
}

/// Additional evidence that would raise the grade of `studies` by at least
/// one tier, one alternative per entry. Empty at `high`.
#[must_use]
pub fn missing_for_upgrade(studies: &[Study]) -> Vec<String> {
    missing_for_counts(&DesignCounts::from_studies(studies))
}

#[must_use]
pub fn missing_for_counts(counts: &DesignCounts) -> Vec<String> {
    let mut gaps = Vec::new();
    match counts.grade() {
        EvidenceGrade::High => {}
        EvidenceGrade::Moderate => {
            let need = HIGH_CONTROLLED_MIN - counts.human_controlled;
            gaps.push(format!(
                "{need} more human controlled {}",
                plural(need, "trial", "trials")
            ));
        }
        grade => {
            if grade == EvidenceGrade::VeryLow {
                let need = LOW_ANIMAL_MIN - counts.animal();
                gaps.push(format!(
                    "{need} more animal or laboratory {}",
                    plural(need, "study", "studies")
                ));
            }
            gaps.push(format!("{MODERATE_CONTROLLED_MIN} human controlled trial"));
            let need = MODERATE_OBSERVATIONAL_MIN - counts.human_observational;
            gaps.push(format!(
                "{need} more human observational {}",
                plural(need, "study", "studies")
            ));
        }
    }
    gaps
}

const fn plural<'a>(n: u32, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}
