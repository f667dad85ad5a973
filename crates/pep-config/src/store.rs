//! Metadata store (libSQL) configuration.

use serde::{Deserialize, Serialize};

fn default_db_path() -> String {
    String::from(".peptide/pages.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Local database file, used when no remote URL is configured.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Remote libSQL URL (e.g., `libsql://pages-org.turso.io`).
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub auth_token: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            url: String::new(),
            auth_token: String::new(),
        }
    }
}

impl StoreConfig {
    /// Whether a remote database is configured.
    pub fn is_remote(&self) -> bool {
        !self.url.is_empty() && !self.auth_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_file() {
        let config = StoreConfig::default();
        assert!(!config.is_remote());
        assert_eq!(config.db_path, ".peptide/pages.db");
    }

    #[test]
    fn remote_needs_url_and_token() {
        let mut config = StoreConfig {
            url: "libsql://pages.turso.io".into(),
            ..Default::default()
        };
        assert!(!config.is_remote());
        config.auth_token = "token".into();
        assert!(config.is_remote());
    }
}
