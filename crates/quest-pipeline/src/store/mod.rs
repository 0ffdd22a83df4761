//! Object storage
//!
//! Artifacts are immutable, key-addressed blobs. The [`ObjectStore`] trait is
//! the seam between the pipeline and the backing storage; [`S3Store`] talks to
//! S3 or MinIO, [`MemoryStore`] keeps everything in-process for tests and
//! local runs. Both provide last-writer-wins semantics per key and no locking
//! primitive, so readers must tolerate concurrent overwrites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quest_common::Result;
use std::collections::HashMap;
use uuid::Uuid;

pub mod memory;
pub mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

/// Metadata describing a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: i64,
    pub content_type: Option<String>,
    /// User-supplied metadata stored alongside the object (e.g. `local_md5`)
    pub metadata: HashMap<String, String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Options applied to a `put`
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl PutOptions {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            metadata: HashMap::new(),
        }
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Key-addressed blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, overwriting any previous value for the key
    async fn put(&self, key: &str, data: Vec<u8>, opts: PutOptions) -> Result<ObjectMeta>;

    /// Read an object's content
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Fetch metadata without reading content; `None` when the key is absent
    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// List keys under a prefix
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Server-side copy between keys
    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()>;

    /// Remove an object; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.head(key).await?.is_some())
    }

    /// Publish an object atomically.
    ///
    /// Stages the content under a temporary key, copies it to the final key
    /// and removes the stage, so readers never observe a truncated write. The
    /// stage key carries a suffix that cannot match the notification filter.
    async fn put_atomic(&self, key: &str, data: Vec<u8>, opts: PutOptions) -> Result<ObjectMeta> {
        let stage_key = format!("{}.stage-{}", key, Uuid::new_v4());
        self.put(&stage_key, data, opts).await?;
        let result = self.copy(&stage_key, key).await;
        self.delete(&stage_key).await?;
        result?;

        self.head(key).await?.ok_or_else(|| {
            quest_common::QuestError::Storage(format!(
                "object vanished after atomic publish: {key}"
            ))
        })
    }
}

#[async_trait]
impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    async fn put(&self, key: &str, data: Vec<u8>, opts: PutOptions) -> Result<ObjectMeta> {
        (**self).put(key, data, opts).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        (**self).get(key).await
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        (**self).head(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).list(prefix).await
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()> {
        (**self).copy(source_key, dest_key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn put_atomic(&self, key: &str, data: Vec<u8>, opts: PutOptions) -> Result<ObjectMeta> {
        (**self).put_atomic(key, data, opts).await
    }
}
