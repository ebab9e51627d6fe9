use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StorageError;
use crate::objects::{GetObjectOutput, ObjectStore};

struct StoredObject {
    body: Vec<u8>,
    etag: String,
    content_type: Option<String>,
}

/// In-process [`ObjectStore`]. Used by tests and `WAYPOINT_STORAGE=memory`;
/// contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_etag() -> String {
    format!("\"{}\"", Uuid::new_v4().simple())
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        let objects = self.objects.read().await;
        let obj = objects.get(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        Ok(GetObjectOutput {
            body: obj.body.clone(),
            etag: Some(obj.etag.clone()),
            content_type: obj.content_type.clone(),
        })
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let etag = new_etag();
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                etag: etag.clone(),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(etag)
    }

    async fn put_object_if_match(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        expected_etag: &str,
    ) -> Result<String, StorageError> {
        let mut objects = self.objects.write().await;
        match objects.get(key) {
            Some(current) if current.etag == expected_etag => {}
            _ => {
                return Err(StorageError::PreconditionFailed {
                    key: key.to_string(),
                });
            }
        }

        let etag = new_etag();
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                etag: etag.clone(),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(etag)
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
