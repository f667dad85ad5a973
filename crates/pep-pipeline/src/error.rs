//! Pipeline error types.
//!
//! Every variant renders with a leading kind tag (`IngestError:`,
//! `SynthesisError:`, `PublishError[<step>]:` ...) so a run record's error
//! message can be classified without the error value itself.

use pep_publish::PublishError;
use pep_sources::IngestError;
use pep_synth::{ComplianceError, SynthesisError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every literature source failed.
    #[error("IngestError: no source answered for '{peptide}' ({sources}): {message}")]
    Ingest {
        /// Comma-separated names of the failed sources.
        sources: String,
        peptide: String,
        message: String,
    },

    /// Nothing usable survived deduplication and quality filtering.
    #[error("NormalizeError: {message} for '{peptide}'")]
    Normalize { peptide: String, message: String },

    /// The generated document could not be produced or parsed.
    #[error("SynthesisError: {message}")]
    Synthesis {
        peptide: String,
        message: String,
        raw_output: Option<String>,
    },

    /// The external compliance audit could not be completed.
    #[error("AuditError: {message} for '{peptide}'")]
    Audit { peptide: String, message: String },

    #[error("PublishError[{}]: {}", .0.step(), .0)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// Kind tag used as the message prefix.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ingest { .. } => "IngestError",
            Self::Normalize { .. } => "NormalizeError",
            Self::Synthesis { .. } => "SynthesisError",
            Self::Audit { .. } => "AuditError",
            Self::Publish(_) => "PublishError",
        }
    }

    #[must_use]
    pub fn audit(peptide: &str, source: &ComplianceError) -> Self {
        Self::Audit {
            peptide: peptide.to_string(),
            message: source.to_string(),
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(e: IngestError) -> Self {
        let sources = e
            .failures
            .iter()
            .map(|f| f.source)
            .collect::<Vec<_>>()
            .join(", ");
        let message = e
            .failures
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Self::Ingest {
            sources,
            peptide: e.peptide,
            message,
        }
    }
}

impl From<SynthesisError> for PipelineError {
    fn from(e: SynthesisError) -> Self {
        Self::Synthesis {
            peptide: e.peptide().to_string(),
            raw_output: e.raw_output().map(str::to_string),
            message: e.to_string(),
        }
    }
}
