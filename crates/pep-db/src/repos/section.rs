//! Versioned page sections.

use pep_core::Section;

use crate::PageDb;
use crate::error::DatabaseError;
use crate::helpers::{finish_tx, get_opt_string, get_u32};

impl PageDb {
    /// Insert the sections of one page version in a single transaction.
    /// Returns the number inserted; on error nothing is written.
    pub async fn insert_sections(
        &self,
        peptide_id: i64,
        version: u32,
        sections: &[Section],
    ) -> Result<usize, DatabaseError> {
        let tx = self.conn().transaction().await?;
        let result = insert_section_rows(&tx, peptide_id, version, sections).await;
        finish_tx(tx, result).await
    }

    pub async fn delete_sections(&self, peptide_id: i64, version: u32) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "DELETE FROM sections WHERE peptide_id = ?1 AND version = ?2",
                libsql::params![peptide_id, i64::from(version)],
            )
            .await?;
        Ok(())
    }

    /// Sections of one page version, by display order.
    pub async fn sections_for(
        &self,
        peptide_id: i64,
        version: u32,
    ) -> Result<Vec<Section>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT display_order, title, content_html, plain_summary FROM sections
                 WHERE peptide_id = ?1 AND version = ?2 ORDER BY display_order",
                libsql::params![peptide_id, i64::from(version)],
            )
            .await?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next().await? {
            sections.push(Section {
                display_order: get_u32(&row, 0)?,
                title: row.get(1)?,
                content_html: row.get(2)?,
                plain_summary: get_opt_string(&row, 3)?,
            });
        }
        Ok(sections)
    }
}

async fn insert_section_rows(
    conn: &libsql::Connection,
    peptide_id: i64,
    version: u32,
    sections: &[Section],
) -> Result<usize, DatabaseError> {
    for section in sections {
        conn.execute(
            "INSERT INTO sections (peptide_id, version, display_order, title, content_html, plain_summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![
                peptide_id,
                i64::from(version),
                i64::from(section.display_order),
                section.title.as_str(),
                section.content_html.as_str(),
                section.plain_summary.as_deref()
            ],
        )
        .await?;
    }
    Ok(sections.len())
}
