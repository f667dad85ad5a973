//! Studies and per-version study links.
//!
//! Study rows are shared across peptides: inserting an id that already exists
//! is silently ignored. Links record which studies a page version was built
//! from and in which order.

use pep_core::Study;

use crate::PageDb;
use crate::error::DatabaseError;
use crate::helpers::finish_tx;

impl PageDb {
    /// Insert studies, skipping ids that are already stored. All rows are
    /// written in one transaction.
    ///
    /// Returns the ids that were actually inserted, in input order.
    pub async fn insert_studies_ignore(&self, studies: &[Study]) -> Result<Vec<String>, DatabaseError> {
        let tx = self.conn().transaction().await?;
        let result = insert_study_rows(&tx, studies).await;
        let inserted = finish_tx(tx, result).await?;
        tracing::debug!(
            total = studies.len(),
            inserted = inserted.len(),
            "studies stored"
        );
        Ok(inserted)
    }

    /// Link `studies` to one page version, preserving order, in one
    /// transaction.
    pub async fn link_studies(
        &self,
        peptide_id: i64,
        version: u32,
        studies: &[Study],
    ) -> Result<usize, DatabaseError> {
        let tx = self.conn().transaction().await?;
        let result = insert_link_rows(&tx, peptide_id, version, studies).await;
        finish_tx(tx, result).await
    }

    pub async fn unlink_studies(&self, peptide_id: i64, version: u32) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "DELETE FROM page_studies WHERE peptide_id = ?1 AND version = ?2",
                libsql::params![peptide_id, i64::from(version)],
            )
            .await?;
        Ok(())
    }

    /// Delete study rows that no page version links to any more.
    pub async fn delete_unlinked_studies(&self, ids: &[String]) -> Result<(), DatabaseError> {
        for id in ids {
            self.conn()
                .execute(
                    "DELETE FROM studies WHERE id = ?1
                     AND NOT EXISTS (SELECT 1 FROM page_studies WHERE study_id = ?1)",
                    [id.as_str()],
                )
                .await?;
        }
        Ok(())
    }

    /// Studies linked to one page version, in page order.
    pub async fn studies_for(&self, peptide_id: i64, version: u32) -> Result<Vec<Study>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT s.data FROM page_studies ps
                 JOIN studies s ON s.id = ps.study_id
                 WHERE ps.peptide_id = ?1 AND ps.version = ?2
                 ORDER BY ps.position",
                libsql::params![peptide_id, i64::from(version)],
            )
            .await?;
        let mut studies: Vec<Study> = Vec::new();
        while let Some(row) = rows.next().await? {
            studies.push(serde_json::from_str(&row.get::<String>(0)?)?);
        }
        Ok(studies)
    }

    pub async fn study_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT 1 FROM studies WHERE id = ?1", [id])
            .await?;
        Ok(rows.next().await?.is_some())
    }
}

async fn insert_study_rows(
    conn: &libsql::Connection,
    studies: &[Study],
) -> Result<Vec<String>, DatabaseError> {
    let mut inserted = Vec::new();
    for study in studies {
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO studies (id, kind, title, study_design, year, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    study.id(),
                    study.kind(),
                    study.title(),
                    study.design().as_str(),
                    study.year(),
                    serde_json::to_string(study)?
                ],
            )
            .await?;
        if affected > 0 {
            inserted.push(study.id().to_string());
        }
    }
    Ok(inserted)
}

async fn insert_link_rows(
    conn: &libsql::Connection,
    peptide_id: i64,
    version: u32,
    studies: &[Study],
) -> Result<usize, DatabaseError> {
    let mut linked = 0;
    for (study, position) in studies.iter().zip(0i64..) {
        let affected = conn
            .execute(
                "INSERT OR IGNORE INTO page_studies (peptide_id, version, study_id, position)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![peptide_id, i64::from(version), study.id(), position],
            )
            .await?;
        if affected > 0 {
            linked += 1;
        }
    }
    Ok(linked)
}
