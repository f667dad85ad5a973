use serde::{Deserialize, Serialize};

use crate::enums::StudyDesign;

/// A literature article (e.g. a PubMed record).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiteratureStudy {
    /// Registry-prefixed identifier, e.g. `PMID:31415926`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// External document identifier (DOI or PMCID) when the source has one.
    #[serde(default)]
    pub doc_id: Option<String>,
    pub study_design: StudyDesign,
}

/// A trial-registry record (e.g. ClinicalTrials.gov).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryTrial {
    /// Registry-prefixed identifier, e.g. `NCT:NCT01234567`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub interventions: Vec<String>,
    #[serde(default)]
    pub enrollment: Option<u32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub completion_date: Option<String>,
    pub study_design: StudyDesign,
}

/// A single research record, either an article or a registered trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Study {
    Literature(LiteratureStudy),
    Trial(RegistryTrial),
}

impl Study {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Literature(s) => &s.id,
            Self::Trial(t) => &t.id,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Literature(s) => &s.title,
            Self::Trial(t) => &t.title,
        }
    }

    #[must_use]
    pub const fn design(&self) -> StudyDesign {
        match self {
            Self::Literature(s) => s.study_design,
            Self::Trial(t) => t.study_design,
        }
    }

    /// Storage discriminator, matching the serde tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Literature(_) => "literature",
            Self::Trial(_) => "trial",
        }
    }

    /// Publication year for articles; start year for trials when parsable.
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        match self {
            Self::Literature(s) => s.year,
            Self::Trial(t) => t.start_date.as_deref().and_then(parse_year),
        }
    }
}

/// Extract a four-digit year from a registry date string.
///
/// Accepts `2019`, `2019-04`, `2019-04-30`, and `April 2019`/`April 30, 2019`.
/// Returns `None` when no plausible year is present.
#[must_use]
pub fn parse_year(date: &str) -> Option<i32> {
    let trimmed = date.trim();
    if trimmed.is_empty() {
        return None;
    }

    let leading: String = trimmed.chars().take(4).collect();
    if leading.len() == 4 && leading.chars().all(|c| c.is_ascii_digit()) {
        return leading.parse().ok().filter(|y| (1800..=2200).contains(y));
    }

    trimmed
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| part.len() == 4)
        .filter_map(|part| part.parse::<i32>().ok())
        .find(|y| (1800..=2200).contains(y))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::parse_year;

    #[rstest]
    #[case("2019", Some(2019))]
    #[case("2019-04", Some(2019))]
    #[case("2019-04-30", Some(2019))]
    #[case("April 2019", Some(2019))]
    #[case("April 30, 2019", Some(2019))]
    #[case("", None)]
    #[case("unknown", None)]
    #[case("19-04", None)]
    #[case("0001-01-01", None)]
    fn parses_registry_dates(#[case] input: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_year(input), expected);
    }
}
