use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entities::Study;
use crate::errors::CoreError;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid slug regex"));

/// Identity of the compound a page is about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeptideIdentity {
    /// URL-safe key, `^[a-z0-9-]+$`.
    pub slug: String,
    /// Display name, e.g. `BPC-157`.
    pub name: String,
    /// Alternative names used when querying sources.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl PeptideIdentity {
    /// Build an identity with an explicit slug.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the slug does not match
    /// `^[a-z0-9-]+$` or the name is blank.
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        aliases: Vec<String>,
    ) -> Result<Self, CoreError> {
        let slug = slug.into();
        let name = name.into();
        validate_slug(&slug)?;
        if name.trim().is_empty() {
            return Err(CoreError::Validation("peptide name is empty".into()));
        }
        Ok(Self {
            slug,
            name,
            aliases,
        })
    }

    /// Build an identity whose slug is derived from the name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the name produces an empty slug.
    pub fn from_name(name: impl Into<String>, aliases: Vec<String>) -> Result<Self, CoreError> {
        let name = name.into();
        let slug = slugify(&name);
        Self::new(slug, name, aliases)
    }

    /// Name followed by aliases, de-duplicated case-insensitively.
    #[must_use]
    pub fn search_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::with_capacity(1 + self.aliases.len());
        for term in std::iter::once(&self.name).chain(self.aliases.iter()) {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                terms.push(term.to_string());
            }
        }
        terms
    }
}

/// Check a slug against `^[a-z0-9-]+$`.
///
/// # Errors
///
/// Returns [`CoreError::Validation`] when the slug is invalid.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "invalid slug '{slug}': must match ^[a-z0-9-]+$"
        )))
    }
}

/// Lower-case a display name and collapse everything else into single dashes.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash && !out.is_empty() {
            out.push('-');
            prev_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// All studies ingested for one peptide before synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudySet {
    pub peptide: PeptideIdentity,
    pub studies: Vec<Study>,
}

impl StudySet {
    #[must_use]
    pub const fn new(peptide: PeptideIdentity, studies: Vec<Study>) -> Self {
        Self { peptide, studies }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.studies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("BPC-157"), "bpc-157");
        assert_eq!(slugify("  Thymosin Beta-4 (TB-500) "), "thymosin-beta-4-tb-500");
        assert_eq!(slugify("GHK–Cu"), "ghk-cu");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn new_rejects_bad_slug() {
        let err = PeptideIdentity::new("BPC_157", "BPC-157", vec![]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(PeptideIdentity::new("bpc-157", "BPC-157", vec![]).is_ok());
    }

    #[test]
    fn from_name_rejects_empty_slug() {
        assert!(PeptideIdentity::from_name("!!!", vec![]).is_err());
    }

    #[test]
    fn search_terms_dedupes_aliases() {
        let id = PeptideIdentity::from_name(
            "BPC-157",
            vec!["bpc-157".into(), "Body Protection Compound".into(), " ".into()],
        )
        .unwrap();
        assert_eq!(
            id.search_terms(),
            vec!["BPC-157".to_string(), "Body Protection Compound".to_string()]
        );
    }
}
