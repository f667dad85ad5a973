//! Cloudflare R2 (object storage) configuration.

use serde::{Deserialize, Serialize};

fn default_bucket_name() -> String {
    String::from("peptide-pages")
}

fn default_local_dir() -> String {
    String::from(".peptide/artifacts")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct R2Config {
    /// Cloudflare account ID.
    #[serde(default)]
    pub account_id: String,

    /// R2 access key ID.
    #[serde(default)]
    pub access_key_id: String,

    /// R2 secret access key.
    #[serde(default)]
    pub secret_access_key: String,

    /// R2 bucket name.
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    /// Custom endpoint URL. If empty, built from `account_id`.
    #[serde(default)]
    pub endpoint: String,

    /// Public base URL that serves bucket objects (custom domain or
    /// `r2.dev` subdomain). If empty, URLs point at the endpoint.
    #[serde(default)]
    pub public_base_url: String,

    /// Directory used for artifacts when R2 is not configured.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,
}

impl Default for R2Config {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket_name: default_bucket_name(),
            endpoint: String::new(),
            public_base_url: String::new(),
            local_dir: default_local_dir(),
        }
    }
}

impl R2Config {
    /// Check if the R2 config has the minimum required fields.
    pub fn is_configured(&self) -> bool {
        !self.account_id.is_empty()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && !self.bucket_name.is_empty()
    }

    /// Build the R2 endpoint URL.
    ///
    /// Returns the custom `endpoint` if set, otherwise builds from `account_id`.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://{}.r2.cloudflarestorage.com", self.account_id)
        } else {
            self.endpoint.clone()
        }
    }

    /// Base URL under which object keys are publicly retrievable, without a
    /// trailing slash.
    pub fn public_url_base(&self) -> String {
        if self.public_base_url.is_empty() {
            format!(
                "{}/{}",
                self.endpoint_url().trim_end_matches('/'),
                self.bucket_name
            )
        } else {
            self.public_base_url.trim_end_matches('/').to_string()
        }
    }
}
