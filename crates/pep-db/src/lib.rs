//! # pep-db
//!
//! libSQL metadata store for published peptide pages.
//!
//! Holds the latest row per peptide slug, versioned sections, the shared
//! study table with per-version links, and an append-only changelog. Every
//! write the publish step performs has a matching compensating operation
//! (`restore_peptide`, `delete_peptide`, `delete_sections`, ...) so a failed
//! publish can be rolled back without a cross-system transaction.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;

#[cfg(test)]
mod test_support;

use std::path::Path;

use libsql::Builder;
use pep_config::StoreConfig;

pub use error::DatabaseError;
pub use repos::changelog::ChangelogEntry;
pub use repos::page::StoredPage;
pub use repos::peptide::{PeptideRow, UpsertOutcome};

/// Central database handle for page metadata.
pub struct PageDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl PageDb {
    /// Open a local-only database at the given path (`:memory:` for tests).
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        let db = Builder::new_local(path).build().await?;
        Self::init(db).await
    }

    /// Open a remote libSQL database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or migrations fail.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        Self::init(db).await
    }

    /// Open whichever database `config` points at.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open(config: &StoreConfig) -> Result<Self, DatabaseError> {
        if config.is_remote() {
            tracing::debug!(url = %config.url, "opening remote page store");
            Self::open_remote(&config.url, &config.auth_token).await
        } else {
            tracing::debug!(path = %config.db_path, "opening local page store");
            Self::open_local(&config.db_path).await
        }
    }

    async fn init(db: libsql::Database) -> Result<Self, DatabaseError> {
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let page_db = Self { db, conn };
        page_db.run_migrations().await?;
        Ok(page_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
