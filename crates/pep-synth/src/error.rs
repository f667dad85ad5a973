//! Synthesis and compliance error types.

use pep_llm::LlmError;
use thiserror::Error;

/// Failures that leave a peptide without usable generated content.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The text-generation capability failed.
    #[error("generation failed for '{peptide}': {source}")]
    Generation {
        peptide: String,
        #[source]
        source: LlmError,
    },

    /// The capability answered, but the answer cannot become a page.
    #[error("unusable output for '{peptide}': {reason}")]
    Unusable {
        peptide: String,
        reason: String,
        raw_output: String,
    },
}

impl SynthesisError {
    #[must_use]
    pub fn peptide(&self) -> &str {
        match self {
            Self::Generation { peptide, .. } | Self::Unusable { peptide, .. } => peptide,
        }
    }

    /// Raw model output, when the failure happened after generation.
    #[must_use]
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Unusable { raw_output, .. } => Some(raw_output),
            Self::Generation { .. } => None,
        }
    }
}

/// Failures of the external compliance audit itself (not a "did not pass").
#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("audit generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("audit verdict could not be parsed: {reason}")]
    Parse { reason: String, raw_output: String },

    #[error("full compliance audit requested but no auditor is configured")]
    NoAuditor,
}
