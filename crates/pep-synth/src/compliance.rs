//! Compliance tiers.
//!
//! `quick_check` is a local, regex-only approximation of the checklist. The
//! full tier asks an external [`ComplianceAuditor`] to review the whole
//! document. The two tiers are separate functions; [`ComplianceGate`] picks
//! one per call.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use pep_core::{ComplianceMode, IssueSeverity, PageRecord, Usage};
use pep_llm::{GenerationRequest, TextGenerator};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::citations;
use crate::error::ComplianceError;

/// Items every page must satisfy.
pub const CHECKLIST: [&str; 6] = [
    "A disclaimer states that the page is not medical advice.",
    "No prescriptive language: the page never tells the reader to take, dose, or use a compound.",
    "Every empirical claim carries an inline [REGISTRY:ID] citation.",
    "Protocols and doses are framed as reported in studies, never as recommended.",
    "Safety uncertainties and adverse findings are surfaced.",
    "No vendor, purchasing, or procurement content.",
];

const BLOCKING_PENALTY: u8 = 15;
const WARNING_PENALTY: u8 = 5;

static DISCLAIMER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)not\s+medical\s+advice").expect("valid disclaimer regex"));

static PRESCRIPTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(you\s+should|you\s+must|we\s+(recommend|suggest|advise)|is\s+recommended|are\s+recommended|(take|inject|administer|use)\s+\d|start(ing)?\s+(with|at)\s+\d|(ideal|optimal|best)\s+(dose|dosage|protocol))",
    )
    .expect("valid prescriptive regex")
});

static PROTOCOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(protocol|regimen|dosing|dosage|cycle)s?\b").expect("valid protocol regex")
});

static REPORTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(report|studi|study|trial|investigat|examin|test|observ|describ|evaluat|used\s+in|administered\s+in)\w*")
        .expect("valid reported regex")
});

static SAFETY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(safety|adverse|risks?|side\s+effects?|toxicity)\b").expect("valid safety regex")
});

static VENDOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(buy|purchase|discount|coupon|vendor|supplier|in\s+stock|add\s+to\s+cart|order\s+now|promo\s+code|free\s+shipping)\b",
    )
    .expect("valid vendor regex")
});

/// Which checklist item a finding belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRule {
    Disclaimer,
    PrescriptiveLanguage,
    UncitedClaim,
    ProtocolFraming,
    SafetyDisclosure,
    VendorContent,
    #[default]
    #[serde(other)]
    Other,
}

/// One compliance finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceIssue {
    pub rule: ComplianceRule,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ComplianceIssue {
    fn blocking(rule: ComplianceRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: IssueSeverity::Blocking,
            message: message.into(),
        }
    }

    fn warning(rule: ComplianceRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }
}

/// Result of either compliance tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub passed: bool,
    /// 0..=100.
    pub score: u8,
    pub issues: Vec<ComplianceIssue>,
    /// Corrected document text suggested by the full tier.
    pub fixed_text: Option<String>,
    pub mode: ComplianceMode,
    /// Tokens spent by the full tier; zero for the quick tier.
    pub usage: Usage,
}

impl ComplianceReport {
    #[must_use]
    pub fn blocking_issues(&self) -> impl Iterator<Item = &ComplianceIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Blocking)
    }

    /// `rule: message` for every blocking issue, joined with `; `.
    #[must_use]
    pub fn blocking_summary(&self) -> String {
        self.blocking_issues()
            .map(|i| format!("{:?}: {}", i.rule, i.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Local regex-only compliance tier.
#[must_use]
pub fn quick_check(record: &PageRecord) -> ComplianceReport {
    let content = content_html(record);
    let mut issues = Vec::new();

    if !record.disclaimers.iter().any(|d| DISCLAIMER_RE.is_match(d)) {
        issues.push(ComplianceIssue::blocking(
            ComplianceRule::Disclaimer,
            "no disclaimer states the page is not medical advice",
        ));
    }

    for sentence in citations::sentences(&content) {
        if let Some(m) = PRESCRIPTIVE_RE.find(&sentence) {
            issues.push(ComplianceIssue::blocking(
                ComplianceRule::PrescriptiveLanguage,
                format!("prescriptive phrase '{}' in: {sentence}", m.as_str()),
            ));
        } else if PROTOCOL_RE.is_match(&sentence) && !REPORTED_RE.is_match(&sentence) {
            issues.push(ComplianceIssue::warning(
                ComplianceRule::ProtocolFraming,
                format!("protocol not framed as reported: {sentence}"),
            ));
        }
        if let Some(m) = VENDOR_RE.find(&sentence) {
            issues.push(ComplianceIssue::blocking(
                ComplianceRule::VendorContent,
                format!("procurement term '{}' in: {sentence}", m.as_str()),
            ));
        }
    }

    let audit = citations::audit(&content);
    if audit.citation_count == 0 {
        issues.push(ComplianceIssue::blocking(
            ComplianceRule::UncitedClaim,
            "page contains no citations",
        ));
    }
    for claim in &audit.missing_claims {
        issues.push(ComplianceIssue::blocking(
            ComplianceRule::UncitedClaim,
            format!("uncited claim: {claim}"),
        ));
    }

    let mentions_safety = record
        .sections
        .iter()
        .any(|s| SAFETY_RE.is_match(&s.title) || SAFETY_RE.is_match(&s.content_html));
    if !mentions_safety {
        issues.push(ComplianceIssue::warning(
            ComplianceRule::SafetyDisclosure,
            "no section discusses safety, risks, or adverse effects",
        ));
    }

    let passed = !issues.iter().any(|i| i.severity == IssueSeverity::Blocking);
    ComplianceReport {
        passed,
        score: score_for(&issues),
        issues,
        fixed_text: None,
        mode: ComplianceMode::Quick,
        usage: Usage::default(),
    }
}

/// Generated content only: summary, section titles and bodies, lay summaries.
/// Disclaimers are excluded: they mention purchasing.
fn content_html(record: &PageRecord) -> String {
    let mut html = record.summary_html.clone();
    for section in &record.sections {
        html.push_str(&format!("\n<h2>{}</h2>\n{}", section.title, section.content_html));
        if let Some(plain) = &section.plain_summary {
            html.push_str(&format!("\n<p>{plain}</p>"));
        }
    }
    html
}

fn score_for(issues: &[ComplianceIssue]) -> u8 {
    issues.iter().fold(100u8, |score, issue| {
        let penalty = match issue.severity {
            IssueSeverity::Blocking => BLOCKING_PENALTY,
            IssueSeverity::Warning => WARNING_PENALTY,
        };
        score.saturating_sub(penalty)
    })
}

// ---------------------------------------------------------------------------
// Full tier
// ---------------------------------------------------------------------------

/// Verdict returned by an external auditor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditVerdict {
    pub passed: bool,
    pub score: u8,
    pub issues: Vec<ComplianceIssue>,
    pub fixed_text: Option<String>,
    pub usage: Usage,
}

/// External capability that audits a document against a checklist.
#[async_trait]
pub trait ComplianceAuditor: Send + Sync {
    /// Review `document` against every item of `checklist`.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError`] when the audit itself cannot be completed.
    async fn audit(&self, checklist: &[&str], document: &str)
    -> Result<AuditVerdict, ComplianceError>;
}

const AUDIT_SYSTEM_PROMPT: &str = "You are a regulatory compliance reviewer for an educational \
research-summary website about peptides. Review the document strictly against the checklist. \
Respond with a single JSON object and nothing else, shaped as: \
{\"passed\": bool, \"score\": 0-100, \"issues\": [{\"rule\": \"disclaimer|prescriptive_language|uncited_claim|protocol_framing|safety_disclosure|vendor_content|other\", \"severity\": \"blocking|warning\", \"message\": string}], \"fixed_text\": string or null}.";

const AUDIT_MAX_TOKENS: u32 = 4096;

/// [`ComplianceAuditor`] on top of a [`TextGenerator`].
pub struct LlmComplianceAuditor {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl LlmComplianceAuditor {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_tokens: AUDIT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl ComplianceAuditor for LlmComplianceAuditor {
    async fn audit(
        &self,
        checklist: &[&str],
        document: &str,
    ) -> Result<AuditVerdict, ComplianceError> {
        let items: String = checklist
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}\n", i + 1))
            .collect();
        let prompt = format!("Checklist:\n{items}\nDocument:\n<document>\n{document}\n</document>");
        let request = GenerationRequest::new(AUDIT_SYSTEM_PROMPT, prompt, self.max_tokens);

        let generation = self.generator.generate(&request).await?;
        let mut verdict = parse_verdict(&generation.text)?;
        verdict.usage = generation.usage;
        tracing::debug!(
            model = self.generator.model(),
            passed = verdict.passed,
            score = verdict.score,
            issues = verdict.issues.len(),
            "compliance audit complete"
        );
        Ok(verdict)
    }
}

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    passed: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    issues: Vec<RawIssue>,
    #[serde(default)]
    fixed_text: Option<String>,
}

#[derive(Deserialize)]
struct RawIssue {
    #[serde(default)]
    rule: ComplianceRule,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default, alias = "description")]
    message: String,
}

/// Parse a JSON verdict, tolerating code fences and surrounding commentary.
fn parse_verdict(raw: &str) -> Result<AuditVerdict, ComplianceError> {
    let parse_err = |reason: String| ComplianceError::Parse {
        reason,
        raw_output: raw.to_string(),
    };
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(parse_err("no JSON object in output".into()));
    };
    if end < start {
        return Err(parse_err("no JSON object in output".into()));
    }
    let data: RawVerdict =
        serde_json::from_str(&raw[start..=end]).map_err(|e| parse_err(e.to_string()))?;

    let issues: Vec<ComplianceIssue> = data
        .issues
        .into_iter()
        .map(|i| ComplianceIssue {
            rule: i.rule,
            severity: severity_from(i.severity.as_deref()),
            message: i.message,
        })
        .collect();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = data
        .score
        .map_or_else(|| score_for(&issues), |s| s.clamp(0.0, 100.0).round() as u8);

    Ok(AuditVerdict {
        passed: data.passed,
        score,
        issues,
        fixed_text: data.fixed_text.filter(|t| !t.trim().is_empty()),
        usage: Usage::default(),
    })
}

fn severity_from(value: Option<&str>) -> IssueSeverity {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("blocking" | "critical" | "high" | "error") => IssueSeverity::Blocking,
        _ => IssueSeverity::Warning,
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Runs one compliance tier and decides pass/fail.
#[derive(Clone, Default)]
pub struct ComplianceGate {
    auditor: Option<Arc<dyn ComplianceAuditor>>,
}

impl ComplianceGate {
    #[must_use]
    pub fn new(auditor: Option<Arc<dyn ComplianceAuditor>>) -> Self {
        Self { auditor }
    }

    #[must_use]
    pub fn has_auditor(&self) -> bool {
        self.auditor.is_some()
    }

    /// Validate `record` with the chosen tier.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::NoAuditor`] for [`ComplianceMode::Full`]
    /// without an auditor, or the auditor's own failure.
    pub async fn validate(
        &self,
        record: &PageRecord,
        mode: ComplianceMode,
    ) -> Result<ComplianceReport, ComplianceError> {
        match mode {
            ComplianceMode::Quick => Ok(quick_check(record)),
            ComplianceMode::Full => {
                let auditor = self.auditor.as_ref().ok_or(ComplianceError::NoAuditor)?;
                let verdict = auditor.audit(&CHECKLIST, &record.audit_text()).await?;
                let has_blocking = verdict
                    .issues
                    .iter()
                    .any(|i| i.severity == IssueSeverity::Blocking);
                Ok(ComplianceReport {
                    passed: verdict.passed && !has_blocking,
                    score: verdict.score.min(100),
                    issues: verdict.issues,
                    fixed_text: verdict.fixed_text,
                    mode: ComplianceMode::Full,
                    usage: verdict.usage,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pep_core::{EvidenceGrade, PeptideIdentity, Section};
    use pretty_assertions::assert_eq;

    use super::*;

    fn section(title: &str, content: &str, order: u32) -> Section {
        Section {
            title: title.into(),
            content_html: content.into(),
            plain_summary: None,
            display_order: order,
        }
    }

    fn clean_record() -> PageRecord {
        PageRecord::draft(
            PeptideIdentity::from_name("BPC-157", vec![]).unwrap(),
            EvidenceGrade::Low,
            "<p>BPC-157 is a synthetic peptide studied mainly in rodents [PMID:1].</p>".into(),
            vec![
                section(
                    "Animal evidence",
                    "<p>Rat studies reported improved tendon healing [PMID:1].</p>",
                    0,
                ),
                section(
                    "Safety and unknowns",
                    "<p>No human safety data are available [PMID:1].</p>",
                    1,
                ),
            ],
            vec![],
        )
    }

    fn rules(report: &ComplianceReport) -> Vec<ComplianceRule> {
        report.issues.iter().map(|i| i.rule).collect()
    }

    #[test]
    fn clean_page_passes_with_full_score() {
        let report = quick_check(&clean_record());
        assert!(report.passed, "{:?}", report.issues);
        assert_eq!(report.score, 100);
        assert_eq!(report.mode, ComplianceMode::Quick);
    }

    #[test]
    fn missing_disclaimer_blocks() {
        let mut record = clean_record();
        record.disclaimers.clear();
        let report = quick_check(&record);
        assert!(!report.passed);
        assert_eq!(rules(&report), vec![ComplianceRule::Disclaimer]);
        assert_eq!(report.score, 85);
    }

    #[test]
    fn prescriptive_language_blocks() {
        let mut record = clean_record();
        record.sections[0].content_html =
            "<p>You should take 250 mcg daily for tendon repair [PMID:1].</p>".into();
        let report = quick_check(&record);
        assert!(!report.passed);
        assert!(rules(&report).contains(&ComplianceRule::PrescriptiveLanguage));
    }

    #[test]
    fn disclaimers_do_not_trip_vendor_rule() {
        // The fixed disclaimers mention "purchase"; only generated content is scanned.
        let report = quick_check(&clean_record());
        assert!(!rules(&report).contains(&ComplianceRule::VendorContent));
    }

    #[test]
    fn vendor_content_blocks() {
        let mut record = clean_record();
        record.summary_html.push_str("<p>Buy research-grade vials with a coupon.</p>");
        let report = quick_check(&record);
        assert!(!report.passed);
        assert!(rules(&report).contains(&ComplianceRule::VendorContent));
    }

    #[test]
    fn uncited_claim_blocks() {
        let mut record = clean_record();
        record.sections[0].content_html.push_str("<p>It reduces inflammation.</p>");
        let report = quick_check(&record);
        assert!(!report.passed);
        assert!(rules(&report).contains(&ComplianceRule::UncitedClaim));
    }

    #[test]
    fn missing_safety_and_unframed_protocol_only_warn() {
        let mut record = clean_record();
        record.sections.truncate(1);
        record
            .sections[0]
            .content_html
            .push_str("<p>A five-day cycle is common [PMID:1].</p>");
        let report = quick_check(&record);
        assert!(report.passed, "{:?}", report.issues);
        assert_eq!(
            rules(&report),
            vec![ComplianceRule::ProtocolFraming, ComplianceRule::SafetyDisclosure]
        );
        assert_eq!(report.score, 90);
    }

    #[test]
    fn score_floors_at_zero() {
        let issues: Vec<_> = (0..10)
            .map(|_| ComplianceIssue::blocking(ComplianceRule::Other, "x"))
            .collect();
        assert_eq!(score_for(&issues), 0);
    }

    #[test]
    fn verdict_parsing_tolerates_fences_and_commentary() {
        let raw = "Here is my review:\n```json\n{\"passed\": false, \"score\": 72.4, \"issues\": [\
                   {\"rule\": \"prescriptive_language\", \"severity\": \"Critical\", \"message\": \"dose advice\"},\
                   {\"rule\": \"tone\", \"severity\": \"minor\", \"description\": \"hedging\"}], \"fixed_text\": \"\"}\n```";
        let verdict = parse_verdict(raw).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.score, 72);
        assert_eq!(verdict.issues[0].rule, ComplianceRule::PrescriptiveLanguage);
        assert_eq!(verdict.issues[0].severity, IssueSeverity::Blocking);
        assert_eq!(verdict.issues[1].rule, ComplianceRule::Other);
        assert_eq!(verdict.issues[1].severity, IssueSeverity::Warning);
        assert_eq!(verdict.issues[1].message, "hedging");
        assert_eq!(verdict.fixed_text, None);
    }

    #[test]
    fn verdict_without_json_is_a_parse_error() {
        let err = parse_verdict("I cannot review this.").unwrap_err();
        assert!(matches!(err, ComplianceError::Parse { ref raw_output, .. } if raw_output == "I cannot review this."));
    }

    #[tokio::test]
    async fn full_mode_without_auditor_errors() {
        let gate = ComplianceGate::default();
        let err = gate
            .validate(&clean_record(), ComplianceMode::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, ComplianceError::NoAuditor));
    }

    struct FixedAuditor(AuditVerdict);

    #[async_trait]
    impl ComplianceAuditor for FixedAuditor {
        async fn audit(
            &self,
            checklist: &[&str],
            document: &str,
        ) -> Result<AuditVerdict, ComplianceError> {
            assert_eq!(checklist.len(), CHECKLIST.len());
            assert!(document.contains("not medical advice"));
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn blocking_issue_overrides_passed_verdict() {
        let gate = ComplianceGate::new(Some(Arc::new(FixedAuditor(AuditVerdict {
            passed: true,
            score: 90,
            issues: vec![ComplianceIssue::blocking(
                ComplianceRule::ProtocolFraming,
                "dose framed as advice",
            )],
            fixed_text: None,
            usage: Usage::new(100, 20),
        }))));
        let report = gate
            .validate(&clean_record(), ComplianceMode::Full)
            .await
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.mode, ComplianceMode::Full);
        assert_eq!(report.usage, Usage::new(100, 20));
    }
}
