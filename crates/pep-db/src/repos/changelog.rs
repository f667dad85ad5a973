//! Append-only publish history.

use chrono::{DateTime, Utc};
use pep_core::EvidenceGrade;
use serde::Serialize;

use crate::PageDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_u32, parse_datetime, parse_enum};

/// One publish of one page version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    pub id: i64,
    pub slug: String,
    pub version: u32,
    pub grade: EvidenceGrade,
    pub study_count: u32,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl PageDb {
    /// Append an entry and return its id.
    pub async fn append_changelog(
        &self,
        slug: &str,
        version: u32,
        grade: EvidenceGrade,
        study_count: u32,
        note: &str,
    ) -> Result<i64, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO changelog (slug, version, grade, study_count, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    slug,
                    i64::from(version),
                    grade.as_str(),
                    i64::from(study_count),
                    note,
                    format_datetime(&Utc::now())
                ],
            )
            .await?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Remove an entry written by a publish that was rolled back.
    pub async fn delete_changelog_entry(&self, id: i64) -> Result<(), DatabaseError> {
        self.conn()
            .execute("DELETE FROM changelog WHERE id = ?1", [id])
            .await?;
        Ok(())
    }

    /// History for `slug`, oldest first.
    pub async fn changelog(&self, slug: &str) -> Result<Vec<ChangelogEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, slug, version, grade, study_count, note, created_at FROM changelog
                 WHERE slug = ?1 ORDER BY version, id",
                [slug],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(ChangelogEntry {
                id: row.get(0)?,
                slug: row.get(1)?,
                version: get_u32(&row, 2)?,
                grade: parse_enum(&row.get::<String>(3)?)?,
                study_count: get_u32(&row, 4)?,
                note: row.get(5)?,
                created_at: parse_datetime(&row.get::<String>(6)?)?,
            });
        }
        Ok(entries)
    }
}
