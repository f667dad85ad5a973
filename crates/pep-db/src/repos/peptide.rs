//! Peptide rows: upsert by slug, snapshot for rollback, restore and delete.

use chrono::{DateTime, Utc};
use pep_core::{EvidenceGrade, PageRecord};

use crate::PageDb;
use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, get_u32, parse_datetime, parse_enum, parse_string_list,
};

const PEPTIDE_COLS: &str = "id, slug, name, aliases, grade, summary_html, human_controlled_count, animal_count, disclaimers, pdf_url, version, last_updated";

/// The stored state of one peptide page (latest version).
#[derive(Debug, Clone, PartialEq)]
pub struct PeptideRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub grade: EvidenceGrade,
    pub summary_html: String,
    pub human_controlled_count: u32,
    pub animal_count: u32,
    pub disclaimers: Vec<String>,
    pub pdf_url: Option<String>,
    pub version: u32,
    pub last_updated: DateTime<Utc>,
}

/// Result of an upsert: the row id and, when the slug already existed, the
/// row as it was before.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub peptide_id: i64,
    pub previous: Option<PeptideRow>,
}

impl UpsertOutcome {
    #[must_use]
    pub const fn created(&self) -> bool {
        self.previous.is_none()
    }
}

fn row_to_peptide(row: &libsql::Row) -> Result<PeptideRow, DatabaseError> {
    Ok(PeptideRow {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        aliases: parse_string_list(&row.get::<String>(3)?)?,
        grade: parse_enum(&row.get::<String>(4)?)?,
        summary_html: row.get(5)?,
        human_controlled_count: get_u32(row, 6)?,
        animal_count: get_u32(row, 7)?,
        disclaimers: parse_string_list(&row.get::<String>(8)?)?,
        pdf_url: get_opt_string(row, 9)?,
        version: get_u32(row, 10)?,
        last_updated: parse_datetime(&row.get::<String>(11)?)?,
    })
}

impl PageDb {
    pub async fn get_peptide(&self, slug: &str) -> Result<Option<PeptideRow>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PEPTIDE_COLS} FROM peptides WHERE slug = ?1"),
                [slug],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_peptide(&row)?)),
            None => Ok(None),
        }
    }

    /// Latest stored version for `slug`, if the page was ever published.
    pub async fn stored_version(&self, slug: &str) -> Result<Option<u32>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT version FROM peptides WHERE slug = ?1", [slug])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(get_u32(&row, 0)?)),
            None => Ok(None),
        }
    }

    /// Every stored peptide, ordered by slug.
    pub async fn list_peptides(&self) -> Result<Vec<PeptideRow>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PEPTIDE_COLS} FROM peptides ORDER BY slug"),
                (),
            )
            .await?;
        let mut peptides = Vec::new();
        while let Some(row) = rows.next().await? {
            peptides.push(row_to_peptide(&row)?);
        }
        Ok(peptides)
    }

    /// Insert or update the row for `record.peptide.slug`.
    ///
    /// The previous row, when there was one, is returned so the caller can
    /// restore it on rollback.
    pub async fn upsert_peptide(
        &self,
        record: &PageRecord,
        pdf_url: Option<&str>,
    ) -> Result<UpsertOutcome, DatabaseError> {
        let previous = self.get_peptide(&record.peptide.slug).await?;

        self.conn()
            .execute(
                "INSERT INTO peptides (slug, name, aliases, grade, summary_html, human_controlled_count, animal_count, disclaimers, pdf_url, version, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(slug) DO UPDATE SET
                    name = excluded.name,
                    aliases = excluded.aliases,
                    grade = excluded.grade,
                    summary_html = excluded.summary_html,
                    human_controlled_count = excluded.human_controlled_count,
                    animal_count = excluded.animal_count,
                    disclaimers = excluded.disclaimers,
                    pdf_url = excluded.pdf_url,
                    version = excluded.version,
                    last_updated = excluded.last_updated",
                libsql::params![
                    record.peptide.slug.as_str(),
                    record.peptide.name.as_str(),
                    serde_json::to_string(&record.peptide.aliases)?,
                    record.grade.as_str(),
                    record.summary_html.as_str(),
                    i64::from(record.human_controlled_count),
                    i64::from(record.animal_count),
                    serde_json::to_string(&record.disclaimers)?,
                    pdf_url,
                    i64::from(record.version),
                    format_datetime(&record.last_updated)
                ],
            )
            .await?;

        let peptide_id = match &previous {
            Some(prev) => prev.id,
            None => self.peptide_id(&record.peptide.slug).await?,
        };
        tracing::debug!(
            slug = %record.peptide.slug,
            peptide_id,
            version = record.version,
            created = previous.is_none(),
            "peptide upserted"
        );
        Ok(UpsertOutcome {
            peptide_id,
            previous,
        })
    }

    async fn peptide_id(&self, slug: &str) -> Result<i64, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT id FROM peptides WHERE slug = ?1", [slug])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }

    /// Put a previously snapshotted row back in place.
    pub async fn restore_peptide(&self, row: &PeptideRow) -> Result<(), DatabaseError> {
        let updated = self
            .conn()
            .execute(
                "UPDATE peptides SET name = ?2, aliases = ?3, grade = ?4, summary_html = ?5,
                    human_controlled_count = ?6, animal_count = ?7, disclaimers = ?8,
                    pdf_url = ?9, version = ?10, last_updated = ?11
                 WHERE id = ?1",
                libsql::params![
                    row.id,
                    row.name.as_str(),
                    serde_json::to_string(&row.aliases)?,
                    row.grade.as_str(),
                    row.summary_html.as_str(),
                    i64::from(row.human_controlled_count),
                    i64::from(row.animal_count),
                    serde_json::to_string(&row.disclaimers)?,
                    row.pdf_url.as_deref(),
                    i64::from(row.version),
                    format_datetime(&row.last_updated)
                ],
            )
            .await?;
        if updated == 0 {
            return Err(DatabaseError::InvalidState(format!(
                "cannot restore peptide {}: row no longer exists",
                row.slug
            )));
        }
        Ok(())
    }

    /// Delete a peptide row; its sections and study links cascade.
    pub async fn delete_peptide(&self, peptide_id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM peptides WHERE id = ?1", [peptide_id])
            .await?;
        Ok(())
    }
}
