//! Inline citation tokens.
//!
//! Generated prose cites a study with `[REGISTRY:ID]`, where `REGISTRY:ID` is
//! exactly the study's `id` (for example `[PMID:31415926]` or
//! `[NCT:NCT01234567]`).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::CoreError;

/// Grammar of one citation token. Group 1 is the registry, group 2 the
/// local id. Other matchers embed this so every token check agrees.
pub const TOKEN_PATTERN: &str = r"\[([A-Z][A-Z0-9]*):([A-Za-z0-9][A-Za-z0-9._/\-]*)\]";

/// Matches one citation token and captures registry and local id.
pub static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("valid citation regex"));

/// Format the inline token for a study id.
#[must_use]
pub fn token_for(study_id: &str) -> String {
    format!("[{study_id}]")
}

/// Split a study id into `(registry, local_id)`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCitation`] when the id has no registry prefix.
pub fn split_id(study_id: &str) -> Result<(&str, &str), CoreError> {
    match study_id.split_once(':') {
        Some((registry, local)) if !registry.is_empty() && !local.is_empty() => {
            Ok((registry, local))
        }
        _ => Err(CoreError::InvalidCitation(study_id.to_string())),
    }
}

/// Every distinct study id cited in `text`, in sorted order.
#[must_use]
pub fn cited_ids(text: &str) -> BTreeSet<String> {
    CITATION_RE
        .captures_iter(text)
        .map(|caps| format!("{}:{}", &caps[1], &caps[2]))
        .collect()
}

/// Whether `text` contains at least one citation token.
#[must_use]
pub fn has_citation(text: &str) -> bool {
    CITATION_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_distinct_ids() {
        let text = "<p>A [PMID:1] and B [PMID:1] and C [NCT:NCT00000001].</p>";
        let ids = cited_ids(text);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("PMID:1"));
        assert!(ids.contains("NCT:NCT00000001"));
    }

    #[test]
    fn ignores_non_tokens() {
        assert!(!has_citation("see [1] and [note] and [pmid:1]"));
        assert!(has_citation("x [DOI:10.1000/xyz-123]"));
    }

    #[test]
    fn token_roundtrip() {
        let token = token_for("PMID:42");
        assert_eq!(token, "[PMID:42]");
        assert!(cited_ids(&token).contains("PMID:42"));
    }

    #[test]
    fn split_requires_prefix() {
        assert_eq!(split_id("PMID:42").unwrap(), ("PMID", "42"));
        assert!(split_id("42").is_err());
        assert!(split_id("PMID:").is_err());
    }
}
