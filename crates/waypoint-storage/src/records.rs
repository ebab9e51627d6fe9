//! Typed access to the JSON records stored under [`waypoint_core::keys`].
//!
//! Filtered reads list a key prefix and scan the records, the same way the
//! bucket layout is walked everywhere else. `ById` filters skip the scan.
//! There is no secondary index: email and session token lookups read every
//! user object, so their cost grows linearly with the user count.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use waypoint_core::filter::{FilterTarget, RecordFilter};
use waypoint_core::keys;
use waypoint_core::models::goal::Goal;
use waypoint_core::models::log::Log;
use waypoint_core::models::milestone::Milestone;
use waypoint_core::models::user::{normalize_email, User};

use crate::error::StorageError;
use crate::objects::ObjectStore;
use crate::state;

/// A record type stored as one JSON object per id.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const PREFIX: &'static str;

    fn key(id: Uuid) -> String;
    fn id(&self) -> Uuid;
    fn created_at(&self) -> jiff::Timestamp;
}

impl Record for User {
    const PREFIX: &'static str = keys::USERS_PREFIX;

    fn key(id: Uuid) -> String {
        keys::user(id)
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn created_at(&self) -> jiff::Timestamp {
        self.created_at
    }
}

impl Record for Goal {
    const PREFIX: &'static str = keys::GOALS_PREFIX;

    fn key(id: Uuid) -> String {
        keys::goal(id)
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn created_at(&self) -> jiff::Timestamp {
        self.created_at
    }
}

impl Record for Milestone {
    const PREFIX: &'static str = keys::MILESTONES_PREFIX;

    fn key(id: Uuid) -> String {
        keys::milestone(id)
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn created_at(&self) -> jiff::Timestamp {
        self.created_at
    }
}

impl Record for Log {
    const PREFIX: &'static str = keys::LOGS_PREFIX;

    fn key(id: Uuid) -> String {
        keys::log(id)
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn created_at(&self) -> jiff::Timestamp {
        self.created_at
    }
}

/// Fetch a record by id. `None` if it does not exist.
pub async fn get<T: Record>(store: &dyn ObjectStore, id: Uuid) -> Result<Option<T>, StorageError> {
    match state::load_json::<T>(store, &T::key(id)).await {
        Ok((record, _)) => Ok(Some(record)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Fetch a record together with its ETag, for a later [`put_if_match`].
pub async fn get_versioned<T: Record>(
    store: &dyn ObjectStore,
    id: Uuid,
) -> Result<Option<(T, String)>, StorageError> {
    match state::load_json::<T>(store, &T::key(id)).await {
        Ok(loaded) => Ok(Some(loaded)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn put<T: Record>(store: &dyn ObjectStore, record: &T) -> Result<(), StorageError> {
    state::save_json(store, &T::key(record.id()), record).await?;
    Ok(())
}

/// Write a record only if it is unchanged since it was read with `etag`.
pub async fn put_if_match<T: Record>(
    store: &dyn ObjectStore,
    record: &T,
    etag: &str,
) -> Result<(), StorageError> {
    state::save_json_if_match(store, &T::key(record.id()), record, etag).await?;
    Ok(())
}

pub async fn delete<T: Record>(store: &dyn ObjectStore, id: Uuid) -> Result<(), StorageError> {
    store.delete_object(&T::key(id)).await
}

/// Load every record of a type, oldest first.
pub async fn list<T: Record>(store: &dyn ObjectStore) -> Result<Vec<T>, StorageError> {
    let keys = store.list_objects(T::PREFIX).await?;

    let mut records = Vec::with_capacity(keys.len());
    for key in &keys {
        match state::load_json::<T>(store, key).await {
            Ok((record, _)) => records.push(record),
            // Deleted between the listing and the read.
            Err(StorageError::NotFound { .. }) => debug!(key = %key, "record vanished during scan"),
            Err(e) => return Err(e),
        }
    }

    records.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
    Ok(records)
}

/// Records matching `filter`, oldest first.
pub async fn find<T: Record + FilterTarget>(
    store: &dyn ObjectStore,
    filter: &RecordFilter,
) -> Result<Vec<T>, StorageError> {
    if let RecordFilter::ById(id) = *filter {
        return Ok(get::<T>(store, id).await?.into_iter().collect());
    }

    let mut records = list::<T>(store).await?;
    records.retain(|record| record.matches(filter));
    Ok(records)
}

pub async fn find_user_by_email(
    store: &dyn ObjectStore,
    email: &str,
) -> Result<Option<User>, StorageError> {
    let email = normalize_email(email);
    Ok(list::<User>(store)
        .await?
        .into_iter()
        .find(|user| user.email == email))
}

/// The user whose persisted session token equals `token`.
pub async fn find_user_by_session_token(
    store: &dyn ObjectStore,
    token: &str,
) -> Result<Option<User>, StorageError> {
    if token.is_empty() {
        return Ok(None);
    }
    Ok(list::<User>(store)
        .await?
        .into_iter()
        .find(|user| user.session_token.as_deref() == Some(token)))
}

/// Outcome of [`swap_session_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSwap {
    Swapped,
    /// The persisted token was not the expected one, or another write landed
    /// between our read and our write.
    Stale,
    /// The user no longer exists.
    Missing,
}

/// Compare-and-swap the persisted session token of a user.
///
/// With `expected = Some(token)` the swap only happens while `token` is still
/// the active session. With `expected = None` any current value is replaced.
/// The write is guarded by the record's ETag, so a concurrent rotation makes
/// the loser observe [`SessionSwap::Stale`].
pub async fn swap_session_token(
    store: &dyn ObjectStore,
    user_id: Uuid,
    expected: Option<&str>,
    replacement: Option<String>,
) -> Result<SessionSwap, StorageError> {
    let key = keys::user(user_id);
    let (mut user, etag) = match state::load_json::<User>(store, &key).await {
        Ok(loaded) => loaded,
        Err(StorageError::NotFound { .. }) => return Ok(SessionSwap::Missing),
        Err(e) => return Err(e),
    };

    if let Some(expected) = expected
        && user.session_token.as_deref() != Some(expected)
    {
        return Ok(SessionSwap::Stale);
    }

    user.session_token = replacement;
    user.updated_at = jiff::Timestamp::now();

    match state::save_json_if_match(store, &key, &user, &etag).await {
        Ok(_) => Ok(SessionSwap::Swapped),
        Err(StorageError::PreconditionFailed { .. }) => {
            warn!(user_id = %user_id, "session token changed concurrently");
            Ok(SessionSwap::Stale)
        }
        Err(e) => Err(e),
    }
}
