//! Deduplication, relevance ordering, and quality filtering of study sets.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use pep_core::{Study, StudyDesign};
use serde::{Deserialize, Serialize};

/// Minimum abstract length for a literature study to support synthesis.
pub const DEFAULT_MIN_ABSTRACT_CHARS: usize = 100;

/// Year used for relevance ordering.
///
/// Studies without a parseable year sort after every dated study in the
/// same design tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortYear {
    Known(i32),
    Unknown,
}

impl SortYear {
    #[must_use]
    pub fn of(study: &Study) -> Self {
        study.year().map_or(Self::Unknown, Self::Known)
    }
}

impl PartialOrd for SortYear {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Relevance order: newer years first, unknown last.
impl Ord for SortYear {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => b.cmp(a),
            (Self::Known(_), Self::Unknown) => Ordering::Less,
            (Self::Unknown, Self::Known(_)) => Ordering::Greater,
            (Self::Unknown, Self::Unknown) => Ordering::Equal,
        }
    }
}

/// Deduplicate by id and sort by relevance.
///
/// The first occurrence of an id wins. Running `normalize` on its own output
/// returns it unchanged.
#[must_use]
pub fn normalize(raw: Vec<Study>) -> Vec<Study> {
    let mut studies = dedupe(raw);
    sort_by_relevance(&mut studies);
    studies
}

/// Drop every study whose id was already seen, keeping input order.
#[must_use]
pub fn dedupe(raw: Vec<Study>) -> Vec<Study> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .filter(|study| seen.insert(study.id().to_string()))
        .collect()
}

/// Stable sort by design priority, then year descending.
pub fn sort_by_relevance(studies: &mut [Study]) {
    studies.sort_by(|a, b| {
        a.design()
            .priority()
            .cmp(&b.design().priority())
            .then_with(|| SortYear::of(a).cmp(&SortYear::of(b)))
    });
}

/// Drop studies that cannot support citation-grounded synthesis.
///
/// Literature studies need an abstract of at least `min_abstract_chars`
/// characters; trials need at least one condition and one intervention.
#[must_use]
pub fn filter_by_quality(studies: Vec<Study>, min_abstract_chars: usize) -> Vec<Study> {
    studies
        .into_iter()
        .filter(|study| match study {
            Study::Literature(article) => article
                .abstract_text
                .as_deref()
                .is_some_and(|text| text.trim().chars().count() >= min_abstract_chars),
            Study::Trial(trial) => !trial.conditions.is_empty() && !trial.interventions.is_empty(),
        })
        .collect()
}

/// Optional per-design caps on how many studies reach the synthesizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLimits {
    caps: HashMap<StudyDesign, usize>,
}

impl CategoryLimits {
    /// Every design capped at `cap`.
    #[must_use]
    pub fn uniform(cap: usize) -> Self {
        Self {
            caps: StudyDesign::ALL.iter().map(|d| (*d, cap)).collect(),
        }
    }

    #[must_use]
    pub fn with(mut self, design: StudyDesign, cap: usize) -> Self {
        self.caps.insert(design, cap);
        self
    }

    #[must_use]
    pub fn cap_for(&self, design: StudyDesign) -> Option<usize> {
        self.caps.get(&design).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }
}

/// Keep at most the capped number of studies per design, preserving order.
#[must_use]
pub fn limit_by_category(studies: Vec<Study>, limits: &CategoryLimits) -> Vec<Study> {
    if limits.is_empty() {
        return studies;
    }
    let mut taken: HashMap<StudyDesign, usize> = HashMap::new();
    studies
        .into_iter()
        .filter(|study| {
            let design = study.design();
            let count = taken.entry(design).or_insert(0);
            match limits.cap_for(design) {
                Some(cap) if *count >= cap => false,
                _ => {
                    *count += 1;
                    true
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pep_core::{LiteratureStudy, RegistryTrial};
    use pretty_assertions::assert_eq;

    use super::*;

    fn article(id: &str, design: StudyDesign, year: Option<i32>, abstract_len: usize) -> Study {
        Study::Literature(LiteratureStudy {
            id: id.into(),
            title: format!("Article {id}"),
            abstract_text: (abstract_len > 0).then(|| "a".repeat(abstract_len)),
            authors: vec![],
            journal: String::new(),
            year,
            doc_id: None,
            study_design: design,
        })
    }

    fn trial(id: &str, start: Option<&str>, conditions: &[&str], interventions: &[&str]) -> Study {
        Study::Trial(RegistryTrial {
            id: id.into(),
            title: format!("Trial {id}"),
            status: "COMPLETED".into(),
            phase: None,
            conditions: conditions.iter().map(|s| (*s).to_string()).collect(),
            interventions: interventions.iter().map(|s| (*s).to_string()).collect(),
            enrollment: None,
            start_date: start.map(str::to_string),
            completion_date: None,
            study_design: StudyDesign::HumanControlledTrial,
        })
    }

    fn ids(studies: &[Study]) -> Vec<&str> {
        studies.iter().map(Study::id).collect()
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let first = article("PMID:1", StudyDesign::AnimalInVivo, Some(2020), 150);
        let dup = article("PMID:1", StudyDesign::HumanControlledTrial, Some(2024), 150);
        let out = dedupe(vec![first.clone(), dup, article("PMID:2", StudyDesign::AnimalInVitro, None, 0)]);
        assert_eq!(ids(&out), vec!["PMID:1", "PMID:2"]);
        assert_eq!(out[0], first);
    }

    #[test]
    fn normalize_is_idempotent() {
        let raw = vec![
            article("PMID:3", StudyDesign::AnimalInVitro, Some(2019), 150),
            trial("NCT:NCT1", Some("2015-04"), &["x"], &["y"]),
            article("PMID:3", StudyDesign::AnimalInVitro, Some(2019), 150),
            article("PMID:4", StudyDesign::HumanObservational, None, 150),
            trial("NCT:NCT1", Some("2015-04"), &["x"], &["y"]),
        ];
        let once = normalize(raw);
        assert_eq!(once.len(), 3);
        let twice = normalize(once.clone());
        assert_eq!(twice, once);
    }

    #[test]
    fn sorts_by_design_then_year_with_unknown_last() {
        let raw = vec![
            article("PMID:old", StudyDesign::AnimalInVivo, Some(2001), 150),
            article("PMID:nodate", StudyDesign::AnimalInVivo, None, 150),
            article("PMID:new", StudyDesign::AnimalInVivo, Some(2022), 150),
            trial("NCT:NCTbad", Some("unknown"), &["x"], &["y"]),
            trial("NCT:NCT2010", Some("2010-01-05"), &["x"], &["y"]),
            article("PMID:obs", StudyDesign::HumanObservational, Some(2023), 150),
        ];
        let out = normalize(raw);
        assert_eq!(
            ids(&out),
            vec![
                "NCT:NCT2010",
                "NCT:NCTbad",
                "PMID:obs",
                "PMID:new",
                "PMID:old",
                "PMID:nodate",
            ]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let raw = vec![
            article("PMID:b", StudyDesign::AnimalInVitro, Some(2020), 150),
            article("PMID:a", StudyDesign::AnimalInVitro, Some(2020), 150),
        ];
        assert_eq!(ids(&normalize(raw)), vec!["PMID:b", "PMID:a"]);
    }

    #[test]
    fn quality_filter_drops_thin_records() {
        let studies = vec![
            article("PMID:short", StudyDesign::AnimalInVivo, None, 99),
            article("PMID:ok", StudyDesign::AnimalInVivo, None, 100),
            article("PMID:none", StudyDesign::AnimalInVivo, None, 0),
            trial("NCT:NCTfull", None, &["Tendon injury"], &["Drug: X"]),
            trial("NCT:NCTnocond", None, &[], &["Drug: X"]),
            trial("NCT:NCTnoint", None, &["Tendon injury"], &[]),
        ];
        let out = filter_by_quality(studies, DEFAULT_MIN_ABSTRACT_CHARS);
        assert_eq!(ids(&out), vec!["PMID:ok", "NCT:NCTfull"]);
    }

    #[test]
    fn category_limits_preserve_order() {
        let studies = normalize(vec![
            article("PMID:v1", StudyDesign::AnimalInVivo, Some(2024), 150),
            article("PMID:v2", StudyDesign::AnimalInVivo, Some(2023), 150),
            article("PMID:v3", StudyDesign::AnimalInVivo, Some(2022), 150),
            article("PMID:t1", StudyDesign::AnimalInVitro, Some(2021), 150),
            article("PMID:h1", StudyDesign::HumanObservational, Some(2010), 150),
        ]);
        let limits = CategoryLimits::default().with(StudyDesign::AnimalInVivo, 2);
        let out = limit_by_category(studies.clone(), &limits);
        assert_eq!(ids(&out), vec!["PMID:h1", "PMID:v1", "PMID:v2", "PMID:t1"]);

        let out = limit_by_category(studies.clone(), &CategoryLimits::uniform(1));
        assert_eq!(ids(&out), vec!["PMID:h1", "PMID:v1", "PMID:t1"]);

        assert_eq!(limit_by_category(studies.clone(), &CategoryLimits::default()), studies);
    }
}
