//! Cross-cutting error types.
//!
//! Domain-specific errors (`SourceError`, `DatabaseError`, `PublishError`, ...)
//! live in their own crates. The pipeline-level taxonomy converges in
//! `pep-pipeline`.

use thiserror::Error;

/// Errors that can be raised by any crate while handling core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A citation token could not be parsed.
    #[error("Invalid citation token: {0}")]
    InvalidCitation(String),
}
