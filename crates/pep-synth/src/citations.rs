//! Citation auditing of generated HTML.
//!
//! A heuristic safety net: every sentence that makes an effect claim must
//! carry at least one `[REGISTRY:ID]` token. False positives and negatives
//! are expected.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use pep_core::{PageRecord, citation};
use regex::Regex;
use serde::{Deserialize, Serialize};

static CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(increas|decreas|improv|reduc|enhanc|inhibit|promot|prevent)\w*")
        .expect("valid claim regex")
});

/// Block-level tags become line breaks so sentences never span elements.
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(p|li|ul|ol|h[1-6]|div|br|tr|td|blockquote)\b[^>]*>")
        .expect("valid block tag regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// A run of citation tokens at the start of a sentence fragment.
static LEADING_TOKENS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{}[\s,;]*)+", citation::TOKEN_PATTERN))
        .expect("valid leading token regex")
});

/// Result of a citation audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationAudit {
    /// Number of distinct study ids cited.
    pub citation_count: usize,
    pub cited_ids: BTreeSet<String>,
    /// Sentences with an effect claim but no citation token.
    pub missing_claims: Vec<String>,
}

impl CitationAudit {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.citation_count > 0 && self.missing_claims.is_empty()
    }
}

/// Audit one HTML document.
#[must_use]
pub fn audit(html: &str) -> CitationAudit {
    let cited_ids = citation::cited_ids(html);
    let missing_claims = sentences(html)
        .into_iter()
        .filter(|s| CLAIM_RE.is_match(s) && !citation::has_citation(s))
        .collect();
    CitationAudit {
        citation_count: cited_ids.len(),
        cited_ids,
        missing_claims,
    }
}

/// Audit the summary and every section of a page.
#[must_use]
pub fn audit_record(record: &PageRecord) -> CitationAudit {
    audit(&record.full_html())
}

/// Study ids in `record` that are never cited, in study order.
#[must_use]
pub fn uncited_studies(record: &PageRecord) -> Vec<String> {
    let cited = citation::cited_ids(&record.full_html());
    record
        .studies
        .iter()
        .map(|s| s.id().to_string())
        .filter(|id| !cited.contains(id))
        .collect()
}

/// Split HTML into plain-text sentences.
///
/// Tokens that open a sentence (`... healing. [PMID:1] Next ...`) belong to
/// the sentence before them.
pub(crate) fn sentences(html: &str) -> Vec<String> {
    let text = BLOCK_TAG_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, " ");
    let text = decode_entities(&text);

    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        for raw in split_sentences(line) {
            let mut sentence = raw.trim().to_string();
            if let Some(m) = LEADING_TOKENS_RE.find(&sentence) {
                if let Some(prev) = out.last_mut() {
                    prev.push(' ');
                    prev.push_str(m.as_str().trim());
                    sentence = sentence[m.end()..].trim().to_string();
                }
            }
            if !sentence.is_empty() {
                out.push(sentence);
            }
        }
    }
    out
}

/// Split on `.`, `!` or `?` followed by whitespace.
fn split_sentences(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    let end = i + c.len_utf8();
                    parts.push(&line[start..end]);
                    start = end;
                }
            }
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }
    parts
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
