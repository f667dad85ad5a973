//! # pep-publish
//!
//! Turns a finished [`PageRecord`](pep_core::PageRecord) into a published
//! page: a rendered document in object storage plus versioned metadata in
//! the page store.
//!
//! Publishing spans two systems with no shared transaction, so
//! [`Publisher`] records a compensation for every completed write and
//! replays them in reverse when a later step fails.

mod artifacts;
mod error;
mod orchestrator;
pub mod render;
pub mod saga;

pub use artifacts::{ArtifactError, ArtifactStore, ObjectStoreArtifacts, document_key};
pub use error::PublishError;
pub use orchestrator::{PublishOutcome, Publisher, stamp};
pub use render::{DocumentRenderer, PdfRenderer, RenderError};
