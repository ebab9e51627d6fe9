use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypoint_auth::flows::{self, Registration};
use waypoint_core::validate::{required, required_text};

use crate::cookie::{clear_session_cookie, read_session_cookie, session_cookie};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, NoPayload};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenPayload {
    pub access_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<NoPayload>, ApiError> {
    let registration = Registration {
        first_name: required_text(req.first_name, "firstName")?,
        last_name: required_text(req.last_name, "lastName")?,
        email: required_text(req.email, "email")?,
        password: required(non_empty(req.password), "password")?,
    };

    flows::register(state.store(), registration).await?;
    Ok(ApiResponse::message(
        StatusCode::CREATED,
        "Registration successful",
    ))
}

/// Returns the access token in the body and the session token as the `jwt`
/// cookie.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = required_text(req.email, "email")?;
    let password = required(non_empty(req.password), "password")?;

    let pair = flows::login(state.store(), &state.tokens, &email, &password).await?;
    let cookie = session_cookie(&pair.session_token, state.tokens.session_ttl())?;

    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::created(
            "Login successful",
            AccessTokenPayload {
                access_token: pair.access_token,
            },
        ),
    )
        .into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    user.ensure_self(id)?;
    flows::logout(state.store(), id).await?;

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        ApiResponse::message(StatusCode::OK, "Log out successful"),
    )
        .into_response())
}

/// Rotate the session cookie. Every failure also clears the cookie.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match rotate(&state, &headers).await {
        Ok(response) => response,
        Err(e) => ([(SET_COOKIE, clear_session_cookie())], e).into_response(),
    }
}

async fn rotate(state: &AppState, headers: &HeaderMap) -> Result<Response, ApiError> {
    let presented = read_session_cookie(headers)
        .ok_or_else(|| ApiError::Unauthorized("No valid token".to_string()))?;

    let pair = flows::refresh(state.store(), &state.tokens, &presented).await?;
    let cookie = session_cookie(&pair.session_token, state.tokens.session_ttl())?;

    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok(
            "Token refreshed",
            AccessTokenPayload {
                access_token: pair.access_token,
            },
        ),
    )
        .into_response())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
