use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{PeptideIdentity, Study};
use crate::enums::{EvidenceGrade, StudyDesign};

/// Legal disclaimers attached to every page.
pub const DISCLAIMERS: [&str; 3] = [
    "This page summarizes published research for educational purposes only and is not medical advice.",
    "Nothing on this page is a recommendation to use, purchase, or dose any compound. Consult a licensed clinician.",
    "Findings from animal and laboratory studies may not translate to humans.",
];

/// A titled block of generated prose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// HTML with inline `[REGISTRY:ID]` citation tokens.
    pub content_html: String,
    #[serde(default)]
    pub plain_summary: Option<String>,
    /// 0-indexed, unique within a page.
    pub display_order: u32,
}

/// The final, versioned, publishable artifact for one peptide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageRecord {
    pub peptide: PeptideIdentity,
    pub grade: EvidenceGrade,
    pub summary_html: String,
    pub sections: Vec<Section>,
    pub studies: Vec<Study>,
    pub human_controlled_count: u32,
    pub animal_count: u32,
    pub disclaimers: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub version: u32,
}

impl PageRecord {
    /// Assemble an unpublished (`version = 0`) record and compute its counts.
    #[must_use]
    pub fn draft(
        peptide: PeptideIdentity,
        grade: EvidenceGrade,
        summary_html: String,
        sections: Vec<Section>,
        studies: Vec<Study>,
    ) -> Self {
        let (human_controlled_count, animal_count) = design_totals(&studies);
        Self {
            peptide,
            grade,
            summary_html,
            sections,
            studies,
            human_controlled_count,
            animal_count,
            disclaimers: DISCLAIMERS.iter().map(|d| (*d).to_string()).collect(),
            last_updated: Utc::now(),
            version: 0,
        }
    }

    /// Summary followed by every section body, as one HTML string.
    #[must_use]
    pub fn full_html(&self) -> String {
        let mut html = self.summary_html.clone();
        for section in &self.sections {
            html.push('\n');
            html.push_str(&section.content_html);
        }
        html
    }

    /// Plain document text used by compliance checks: summary, sections,
    /// lay summaries and disclaimers.
    #[must_use]
    pub fn audit_text(&self) -> String {
        let mut text = format!("{}\n{}\n", self.peptide.name, self.summary_html);
        for section in &self.sections {
            text.push_str(&format!("\n<h2>{}</h2>\n{}\n", section.title, section.content_html));
            if let Some(plain) = &section.plain_summary {
                text.push_str(plain);
                text.push('\n');
            }
        }
        for disclaimer in &self.disclaimers {
            text.push_str(disclaimer);
            text.push('\n');
        }
        text
    }

    /// Total number of studies the page was generated from.
    #[must_use]
    pub fn study_count(&self) -> usize {
        self.studies.len()
    }
}

/// `(human controlled trials, animal studies)` for a study list.
fn design_totals(studies: &[Study]) -> (u32, u32) {
    let mut controlled = 0u32;
    let mut animal = 0u32;
    for study in studies {
        let design = study.design();
        if design == StudyDesign::HumanControlledTrial {
            controlled += 1;
        }
        if design.is_animal() {
            animal += 1;
        }
    }
    (controlled, animal)
}
