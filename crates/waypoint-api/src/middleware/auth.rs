use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use waypoint_auth::jwt::AccessIdentity;

use crate::error::ApiError;
use crate::state::AppState;

/// Access token validation middleware.
///
/// Extracts the `Authorization: Bearer <token>` header and verifies the
/// token's signature and expiry. On success, inserts [`AuthUser`] into
/// request extensions for handlers to use.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = {
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

        state.tokens.verify_access(token).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            ApiError::Forbidden("Invalid token".to_string())
        })?
    };

    req.extensions_mut().insert(AuthUser::from(identity));

    Ok(next.run(req).await)
}

/// Authenticated user extracted from access token claims.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub first_name: String,
    pub last_name: String,
    pub id: Uuid,
    pub profile_picture: Option<String>,
}

impl From<AccessIdentity> for AuthUser {
    fn from(identity: AccessIdentity) -> Self {
        Self {
            first_name: identity.first_name,
            last_name: identity.last_name,
            id: identity.id,
            profile_picture: identity.profile_picture,
        }
    }
}

impl AuthUser {
    /// The caller must own the record.
    pub fn ensure_owns(&self, owner: Uuid) -> Result<(), ApiError> {
        if self.id == owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden("User unauthorized".to_string()))
        }
    }

    /// The caller must be the user named in the path.
    pub fn ensure_self(&self, id: Uuid) -> Result<(), ApiError> {
        if self.id == id {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Unauthorized".to_string()))
        }
    }
}
