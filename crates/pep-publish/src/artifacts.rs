//! Object storage for rendered documents.

use std::path::Path as FsPath;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use pep_config::R2Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("artifact store configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage key for one rendered page version.
#[must_use]
pub fn document_key(slug: &str, version: u32) -> String {
    format!("peptides/{slug}/v{version}.pdf")
}

/// Key-addressed blob storage with public URLs.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), ArtifactError>;

    /// Size in bytes, or `None` when the key does not exist.
    async fn head(&self, key: &str) -> Result<Option<u64>, ArtifactError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, ArtifactError>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), ArtifactError>;

    /// Public URL for `key`.
    fn url_for(&self, key: &str) -> String;
}

/// [`ArtifactStore`] over any `object_store` backend.
pub struct ObjectStoreArtifacts {
    store: Arc<dyn ObjectStore>,
    base_url: String,
    /// The local filesystem backend rejects object attributes.
    content_type_supported: bool,
}

impl ObjectStoreArtifacts {
    /// Cloudflare R2 through the S3-compatible API.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Config`] when R2 is not configured, or the
    /// builder's own error.
    pub fn r2(config: &R2Config) -> Result<Self, ArtifactError> {
        if !config.is_configured() {
            return Err(ArtifactError::Config(
                "r2 account_id, access_key_id, secret_access_key and bucket_name are required"
                    .into(),
            ));
        }
        let store = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket_name)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_endpoint(config.endpoint_url())
            .with_region("auto")
            .build()?;
        Ok(Self {
            store: Arc::new(store),
            base_url: config.public_url_base(),
            content_type_supported: true,
        })
    }

    /// Files under `dir`, addressed by `file://` URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn local(dir: impl AsRef<FsPath>) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let dir = dir.canonicalize()?;
        let store = LocalFileSystem::new_with_prefix(&dir)?;
        Ok(Self {
            store: Arc::new(store),
            base_url: format!("file://{}", dir.display()),
            content_type_supported: false,
        })
    }

    /// In-process storage, for tests and dry runs.
    #[must_use]
    pub fn in_memory(base_url: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            content_type_supported: true,
        }
    }

    /// R2 when configured, otherwise the local fallback directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen backend cannot be built.
    pub fn from_config(config: &R2Config) -> Result<Self, ArtifactError> {
        if config.is_configured() {
            tracing::debug!(bucket = %config.bucket_name, "using R2 artifact store");
            Self::r2(config)
        } else {
            tracing::debug!(dir = %config.local_dir, "R2 not configured, using local artifact store");
            Self::local(&config.local_dir)
        }
    }
}

fn object_path(key: &str) -> Result<Path, ArtifactError> {
    Path::parse(key).map_err(|e| ArtifactError::InvalidKey {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl ArtifactStore for ObjectStoreArtifacts {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), ArtifactError> {
        let path = object_path(key)?;
        let mut attributes = Attributes::new();
        if self.content_type_supported {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };
        self.store
            .put_opts(&path, PutPayload::from(bytes), opts)
            .await?;
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<Option<u64>, ArtifactError> {
        let path = object_path(key)?;
        match self.store.head(&path).await {
            Ok(meta) => Ok(Some(meta.size)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = object_path(key)?;
        let bytes = self.store.get(&path).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), ArtifactError> {
        let path = object_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }
}
