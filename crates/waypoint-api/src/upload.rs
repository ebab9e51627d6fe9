//! Multipart form parsing and image storage for log and profile uploads.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use uuid::Uuid;

use waypoint_core::keys;
use waypoint_storage::error::StorageError;
use waypoint_storage::objects::ObjectStore;

use crate::error::ApiError;

/// [`Multipart`] whose rejection uses the `{message}` envelope.
pub struct ApiMultipart(pub Multipart);

impl<S: Send + Sync> FromRequest<S> for ApiMultipart {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Multipart::from_request(req, state).await?))
    }
}

#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Text fields and image parts of a multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub images: Vec<UploadedImage>,
}

impl MultipartForm {
    /// Drain a multipart body. Parts named `image_field` are collected as
    /// images (at most `max_images`, each with an `image/*` content type);
    /// every other named part is read as text.
    pub async fn read(
        mut multipart: Multipart,
        image_field: &str,
        max_images: usize,
    ) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name != image_field {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            }

            let file_name = field.file_name().map(str::to_string).unwrap_or_default();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;

            // Browsers submit an empty part for an untouched file input.
            if bytes.is_empty() && file_name.is_empty() {
                continue;
            }

            let Some(content_type) = content_type.filter(|ct| ct.starts_with("image/")) else {
                return Err(ApiError::BadRequest(format!(
                    "{image_field} must be image files"
                )));
            };
            if form.images.len() == max_images {
                return Err(ApiError::BadRequest(format!(
                    "At most {max_images} {image_field} allowed"
                )));
            }

            form.images.push(UploadedImage {
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(form)
    }

    /// Remove and return a text field. Blank values count as absent.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(name)
            .filter(|value| !value.trim().is_empty())
    }
}

/// Store uploaded images under the owner's prefix. Returns the object keys.
pub async fn store_images(
    store: &dyn ObjectStore,
    owner: Uuid,
    images: Vec<UploadedImage>,
) -> Result<Vec<String>, StorageError> {
    let mut stored = Vec::with_capacity(images.len());
    for image in images {
        let key = keys::image(owner, Uuid::new_v4(), &image.file_name);
        if let Err(e) = store
            .put_object(&key, image.bytes.to_vec(), Some(&image.content_type))
            .await
        {
            discard_images(store, &stored).await;
            return Err(e);
        }
        stored.push(key);
    }
    Ok(stored)
}

/// Best-effort removal of images whose owning record was never written.
pub async fn discard_images(store: &dyn ObjectStore, keys: &[String]) {
    if let Err(e) = delete_images(store, keys).await {
        tracing::warn!(error = %e, count = keys.len(), "failed to discard orphaned images");
    }
}

pub async fn delete_images(store: &dyn ObjectStore, keys: &[String]) -> Result<(), StorageError> {
    for key in keys {
        store.delete_object(key).await?;
    }
    Ok(())
}
