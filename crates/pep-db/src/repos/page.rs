//! Reading a published page back as a `PageRecord`.

use pep_core::{PageRecord, PeptideIdentity};

use crate::PageDb;
use crate::error::DatabaseError;

/// The latest stored page and where its document lives.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPage {
    pub record: PageRecord,
    pub pdf_url: Option<String>,
}

impl PageDb {
    /// Reconstruct the latest published version of `slug`.
    pub async fn load_page(&self, slug: &str) -> Result<Option<StoredPage>, DatabaseError> {
        let Some(row) = self.get_peptide(slug).await? else {
            return Ok(None);
        };
        let sections = self.sections_for(row.id, row.version).await?;
        let studies = self.studies_for(row.id, row.version).await?;

        let record = PageRecord {
            peptide: PeptideIdentity {
                slug: row.slug,
                name: row.name,
                aliases: row.aliases,
            },
            grade: row.grade,
            summary_html: row.summary_html,
            sections,
            studies,
            human_controlled_count: row.human_controlled_count,
            animal_count: row.animal_count,
            disclaimers: row.disclaimers,
            last_updated: row.last_updated,
            version: row.version,
        };
        Ok(Some(StoredPage {
            record,
            pdf_url: row.pdf_url,
        }))
    }
}
