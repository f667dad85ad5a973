//! Publish error types.

use pep_db::DatabaseError;
use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::render::RenderError;

/// A publish attempt failed. Any completed writes were compensated before
/// this error was returned.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("page '{slug}' is not publishable: {reason}")]
    Invalid { slug: String, reason: String },

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("metadata store failed: {0}")]
    Metadata(#[from] DatabaseError),

    #[error("upload failed: {0}")]
    Upload(#[from] ArtifactError),

    #[error("uploaded object '{key}' failed verification: {reason}")]
    Verify { key: String, reason: String },
}

impl PublishError {
    /// Name of the publish step that failed.
    #[must_use]
    pub const fn step(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "validate",
            Self::Render(_) => "render",
            Self::Metadata(_) => "metadata",
            Self::Upload(_) => "upload",
            Self::Verify { .. } => "verify",
        }
    }
}
