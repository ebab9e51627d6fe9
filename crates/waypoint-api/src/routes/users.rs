use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypoint_audit::AuditEvent;
use waypoint_core::models::user::{normalize_email, User, UserProfile};
use waypoint_storage::records;

use crate::cascade;
use crate::cookie::clear_session_cookie;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::upload::{self, ApiMultipart, MultipartForm};

/// Multipart part name for the profile picture.
pub const PICTURE_FIELD: &str = "profilePicture";

#[derive(Debug, Deserialize)]
pub struct UserEditQuery {
    pub edit: Option<bool>,
}

#[derive(Serialize)]
pub struct UserPayload {
    pub user: UserProfile,
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<UserPayload>, ApiError> {
    caller.ensure_self(id)?;
    let user = records::get::<User>(state.store(), id)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(ApiResponse::ok(
        "User details found",
        UserPayload {
            user: UserProfile::from(&user),
        },
    ))
}

/// `PUT /users/{id}?edit=true` with optional `firstName`, `lastName`,
/// `email` parts and at most one `profilePicture` image.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UserEditQuery>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<UserPayload>, ApiError> {
    caller.ensure_self(id)?;
    if query.edit != Some(true) {
        return Err(ApiError::BadRequest("Edit invalid".to_string()));
    }

    let mut form = MultipartForm::read(multipart, PICTURE_FIELD, 1).await?;
    let (mut user, etag) = records::get_versioned::<User>(state.store(), id)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(first_name) = form.take("firstName") {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = form.take("lastName") {
        user.last_name = last_name.trim().to_string();
    }
    if let Some(email) = form.take("email") {
        let email = normalize_email(&email);
        if email != user.email {
            if let Some(holder) = records::find_user_by_email(state.store(), &email).await?
                && holder.id != user.id
            {
                return Err(ApiError::Conflict("Email already used".to_string()));
            }
            user.email = email;
        }
    }

    let stored = upload::store_images(state.store(), user.id, form.images).await?;
    let replaced_picture = match stored.first() {
        Some(key) => user.profile_picture.replace(key.clone()),
        None => None,
    };

    user.updated_at = jiff::Timestamp::now();
    if let Err(e) = records::put_if_match(state.store(), &user, &etag).await {
        upload::discard_images(state.store(), &stored).await;
        return Err(e.into());
    }

    if let Some(old) = replaced_picture {
        upload::delete_images(state.store(), &[old]).await?;
    }

    AuditEvent::new("user.update", "user", user.id)
        .by(caller.id)
        .emit();
    Ok(ApiResponse::created(
        "User details edited",
        UserPayload {
            user: UserProfile::from(&user),
        },
    ))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    caller.ensure_self(id)?;
    let user = records::get::<User>(state.store(), id)
        .await?
        .ok_or_else(user_not_found)?;

    cascade::delete_user_tree(state.store(), &user).await?;

    AuditEvent::new("user.delete", "user", user.id)
        .by(caller.id)
        .emit();
    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        ApiResponse::message(StatusCode::CREATED, "User deleted"),
    )
        .into_response())
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}
