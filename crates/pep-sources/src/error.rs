//! Literature source error types.

use std::time::Duration;

use thiserror::Error;

/// Errors from a single literature provider.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

impl SourceError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Parse(_) => false,
        }
    }

    /// Server-provided wait before the next attempt, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}

/// A provider that failed during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: &'static str,
    pub message: String,
}

/// Every provider failed, so the peptide has no studies to work with.
#[derive(Debug, Error)]
#[error("all sources failed for '{peptide}': {}", summarize(.failures))]
pub struct IngestError {
    pub peptide: String,
    pub failures: Vec<SourceFailure>,
}

fn summarize(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.source, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SourceError::RateLimited { retry_after_secs: 5 }.is_transient());
        assert!(
            SourceError::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !SourceError::Api {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!SourceError::Parse("bad".into()).is_transient());
    }

    #[test]
    fn ingest_error_lists_every_source() {
        let err = IngestError {
            peptide: "bpc-157".into(),
            failures: vec![
                SourceFailure {
                    source: "europe_pmc",
                    message: "API error (500): boom".into(),
                },
                SourceFailure {
                    source: "clinical_trials",
                    message: "timeout".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "all sources failed for 'bpc-157': europe_pmc: API error (500): boom; clinical_trials: timeout"
        );
    }
}
