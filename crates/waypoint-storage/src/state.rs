use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;
use crate::objects::ObjectStore;

/// Load a JSON object. Returns the deserialized value and its ETag.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<(T, String), StorageError> {
    let output = store.get_object(key).await?;
    let value: T = serde_json::from_slice(&output.body)?;
    let etag = output.etag.unwrap_or_default();
    Ok((value, etag))
}

/// Save a JSON object. Returns the new ETag.
pub async fn save_json<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec(value)?;
    store.put_object(key, body, Some("application/json")).await
}

/// Save a JSON object with ETag optimistic locking.
pub async fn save_json_if_match<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
    expected_etag: &str,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec(value)?;
    store
        .put_object_if_match(key, body, Some("application/json"), expected_etag)
        .await
}
