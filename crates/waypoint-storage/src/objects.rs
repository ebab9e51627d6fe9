use async_trait::async_trait;

use crate::error::StorageError;

/// Result of a GET operation, including the body and ETag.
pub struct GetObjectOutput {
    pub body: Vec<u8>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Key/value object storage with ETag preconditions.
///
/// Implemented by [`crate::s3::S3ObjectStore`] and
/// [`crate::memory::MemoryObjectStore`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get an object. Missing keys are `StorageError::NotFound`.
    async fn get_object(&self, key: &str) -> Result<GetObjectOutput, StorageError>;

    /// Put an object. Returns the new ETag.
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Put an object only if its current ETag equals `expected_etag`.
    /// Returns the new ETag, or `StorageError::PreconditionFailed`.
    async fn put_object_if_match(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        expected_etag: &str,
    ) -> Result<String, StorageError>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// List keys under a prefix.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete all objects under a prefix. Returns the number deleted.
    async fn delete_objects_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys = self.list_objects(prefix).await?;
        let count = keys.len();
        for key in &keys {
            self.delete_object(key).await?;
        }
        Ok(count)
    }
}
