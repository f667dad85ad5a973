//! The publish step: render, write metadata, upload, verify.
//!
//! There is no transaction spanning the metadata store and object storage.
//! Each write registers a compensation on a [`Saga`]; when a later step fails
//! the saga runs in reverse and the original error is returned. Multi-row
//! writes are atomic in the store, and version-scoped link and section
//! deletes are registered before their write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use futures::FutureExt;
use pep_core::PageRecord;
use pep_db::{PageDb, PeptideRow};
use serde::Serialize;

use crate::artifacts::{ArtifactStore, document_key};
use crate::error::PublishError;
use crate::render::DocumentRenderer;
use crate::saga::Saga;

/// What a successful publish wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishOutcome {
    pub pdf_url: String,
    /// Studies that were new to the store (duplicates are ignored).
    pub studies_inserted: usize,
    pub sections_inserted: usize,
    /// The record as published, with its stamped version and timestamp.
    pub record: PageRecord,
    /// Whether this publish created the peptide.
    pub created: bool,
}

struct Written {
    studies_inserted: usize,
    sections_inserted: usize,
    created: bool,
}

/// Stamp `record` as the version after `previous`.
///
/// The first publish of a slug is version 1. `last_updated` is truncated to
/// milliseconds (storage precision) and is always at least 1ms after the
/// previous version's timestamp.
pub fn stamp(record: &mut PageRecord, previous: Option<(u32, DateTime<Utc>)>, now: DateTime<Utc>) {
    let now = now.trunc_subsecs(3);
    match previous {
        Some((version, last_updated)) => {
            record.version = version.saturating_add(1);
            record.last_updated = now.max(last_updated + Duration::milliseconds(1));
        }
        None => {
            record.version = 1;
            record.last_updated = now;
        }
    }
}

/// Reject records whose sections share a display order. Checked before any
/// write so a bad record never touches the store.
fn check_section_order(record: &PageRecord) -> Result<(), PublishError> {
    let mut seen = HashSet::new();
    for section in &record.sections {
        if !seen.insert(section.display_order) {
            return Err(PublishError::Invalid {
                slug: record.peptide.slug.clone(),
                reason: format!(
                    "display order {} is used by more than one section",
                    section.display_order
                ),
            });
        }
    }
    Ok(())
}

/// Publishes page records to the metadata store and object storage.
pub struct Publisher {
    db: Arc<PageDb>,
    artifacts: Arc<dyn ArtifactStore>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl Publisher {
    #[must_use]
    pub fn new(
        db: Arc<PageDb>,
        artifacts: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            db,
            artifacts,
            renderer,
        }
    }

    #[must_use]
    pub fn db(&self) -> &PageDb {
        &self.db
    }

    /// Publish `record` as the next version of its slug.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] tagged with the failing step. Writes made
    /// before the failure have been compensated.
    pub async fn publish(&self, mut record: PageRecord) -> Result<PublishOutcome, PublishError> {
        let slug = record.peptide.slug.clone();
        check_section_order(&record)?;
        let previous = self.db.get_peptide(&slug).await?;
        stamp(
            &mut record,
            previous.as_ref().map(|p| (p.version, p.last_updated)),
            Utc::now(),
        );

        let bytes = self.renderer.render(&record)?;
        let key = document_key(&slug, record.version);
        let pdf_url = self.artifacts.url_for(&key);

        let mut saga = Saga::new();
        let result = self
            .write_all(&record, previous.as_ref(), &key, &pdf_url, bytes, &mut saga)
            .await;

        match result {
            Ok(written) => {
                saga.commit();
                tracing::info!(
                    slug = %slug,
                    version = record.version,
                    url = %pdf_url,
                    studies_inserted = written.studies_inserted,
                    "page published"
                );
                Ok(PublishOutcome {
                    pdf_url,
                    studies_inserted: written.studies_inserted,
                    sections_inserted: written.sections_inserted,
                    record,
                    created: written.created,
                })
            }
            Err(e) => {
                tracing::warn!(
                    slug = %slug,
                    step = e.step(),
                    compensations = saga.len(),
                    %e,
                    "publish failed, rolling back"
                );
                let failures = saga.compensate().await;
                if !failures.is_empty() {
                    tracing::error!(
                        slug = %slug,
                        failed = failures.len(),
                        "rollback incomplete; manual cleanup may be required"
                    );
                }
                Err(e)
            }
        }
    }

    /// Publish an already-published record again as a new version.
    ///
    /// # Errors
    ///
    /// Same as [`Publisher::publish`].
    pub async fn republish(&self, record: PageRecord) -> Result<PublishOutcome, PublishError> {
        let stored = self.db.stored_version(&record.peptide.slug).await?;
        if stored != Some(record.version) {
            tracing::warn!(
                slug = %record.peptide.slug,
                record_version = record.version,
                stored_version = ?stored,
                "republishing a record that is not the stored version"
            );
        }
        self.publish(record).await
    }

    async fn write_all<'a>(
        &'a self,
        record: &PageRecord,
        previous: Option<&PeptideRow>,
        key: &str,
        pdf_url: &str,
        bytes: Vec<u8>,
        saga: &mut Saga<'a>,
    ) -> Result<Written, PublishError> {
        let db: &'a PageDb = &self.db;
        let artifacts: &'a dyn ArtifactStore = &*self.artifacts;
        let version = record.version;

        let outcome = db.upsert_peptide(record, Some(pdf_url)).await?;
        let peptide_id = outcome.peptide_id;
        let created = outcome.created();
        match outcome.previous {
            Some(prev) => saga.push(
                "restore_peptide",
                async move { db.restore_peptide(&prev).await.map_err(|e| e.to_string()) }.boxed(),
            ),
            None => saga.push(
                "delete_peptide",
                async move { db.delete_peptide(peptide_id).await.map_err(|e| e.to_string()) }
                    .boxed(),
            ),
        }

        let inserted = db.insert_studies_ignore(&record.studies).await?;
        let studies_inserted = inserted.len();
        saga.push(
            "delete_studies",
            async move {
                db.delete_unlinked_studies(&inserted)
                    .await
                    .map_err(|e| e.to_string())
            }
            .boxed(),
        );

        // Version-scoped deletes are idempotent, so they are registered before
        // the write and also clean up after a partially applied one.
        saga.push(
            "unlink_studies",
            async move {
                db.unlink_studies(peptide_id, version)
                    .await
                    .map_err(|e| e.to_string())
            }
            .boxed(),
        );
        db.link_studies(peptide_id, version, &record.studies).await?;

        saga.push(
            "delete_sections",
            async move {
                db.delete_sections(peptide_id, version)
                    .await
                    .map_err(|e| e.to_string())
            }
            .boxed(),
        );
        let sections_inserted = db
            .insert_sections(peptide_id, version, &record.sections)
            .await?;

        let note = changelog_note(previous, record);
        let entry_id = db
            .append_changelog(
                &record.peptide.slug,
                version,
                record.grade,
                u32::try_from(record.study_count()).unwrap_or(u32::MAX),
                &note,
            )
            .await?;
        saga.push(
            "delete_changelog",
            async move {
                db.delete_changelog_entry(entry_id)
                    .await
                    .map_err(|e| e.to_string())
            }
            .boxed(),
        );

        let expected = bytes.len() as u64;
        artifacts
            .put(key, bytes, self.renderer.content_type())
            .await?;
        let owned_key = key.to_string();
        saga.push(
            "delete_artifact",
            async move { artifacts.delete(&owned_key).await.map_err(|e| e.to_string()) }.boxed(),
        );

        match artifacts.head(key).await? {
            Some(size) if size == expected => {}
            Some(size) => {
                return Err(PublishError::Verify {
                    key: key.to_string(),
                    reason: format!("expected {expected} bytes, found {size}"),
                });
            }
            None => {
                return Err(PublishError::Verify {
                    key: key.to_string(),
                    reason: "object missing after upload".into(),
                });
            }
        }

        Ok(Written {
            studies_inserted,
            sections_inserted,
            created,
        })
    }
}

fn changelog_note(previous: Option<&PeptideRow>, record: &PageRecord) -> String {
    match previous {
        None => "first publish".to_string(),
        Some(prev) if prev.grade != record.grade => {
            format!("grade {} -> {}", prev.grade, record.grade)
        }
        Some(_) => "content refresh".to_string(),
    }
}
