//! # pep-synth
//!
//! Everything between a graded study set and a publishable page:
//!
//! - [`Synthesizer`]: prompt construction, generation, and output parsing
//! - [`citations`]: the local citation audit
//! - [`compliance`]: quick (local) and full (external) compliance tiers

pub mod citations;
pub mod compliance;
mod error;
mod parse;
mod synthesizer;

pub use citations::{CitationAudit, audit, audit_record, uncited_studies};
pub use compliance::{
    AuditVerdict, CHECKLIST, ComplianceAuditor, ComplianceGate, ComplianceIssue, ComplianceReport,
    ComplianceRule, LlmComplianceAuditor, quick_check,
};
pub use error::{ComplianceError, SynthesisError};
pub use parse::{FALLBACK_SECTION_TITLE, ParsedDocument, parse_synthesis, strip_tags};
pub use synthesizer::{DEFAULT_MAX_TOKENS, SYSTEM_PROMPT, Synthesis, Synthesizer, build_prompt};
