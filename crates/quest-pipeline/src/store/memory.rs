//! In-process object store backend
//!
//! Used by tests and local pipeline runs. Keys behave like S3 keys:
//! last-writer-wins, no partial writes, no ordering across keys.

use async_trait::async_trait;
use chrono::Utc;
use quest_common::{QuestError, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ObjectMeta, ObjectStore, PutOptions};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    meta: ObjectMeta,
}

/// In-memory [`ObjectStore`] implementation
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Vec<u8>, opts: PutOptions) -> Result<ObjectMeta> {
        let meta = ObjectMeta {
            key: key.to_string(),
            size: data.len() as i64,
            content_type: opts.content_type,
            metadata: opts.metadata,
            last_modified: Some(Utc::now()),
        };

        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                meta: meta.clone(),
            },
        );

        Ok(meta)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(key)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| QuestError::ObjectNotFound(key.to_string()))
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects.get(key).map(|obj| obj.meta.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let mut copied = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| QuestError::ObjectNotFound(source_key.to_string()))?;

        copied.meta.key = dest_key.to_string();
        copied.meta.last_modified = Some(Utc::now());
        objects.insert(dest_key.to_string(), copied);

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.remove(key);
        Ok(())
    }
}
