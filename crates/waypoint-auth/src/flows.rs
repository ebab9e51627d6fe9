use tracing::{debug, info, warn};
use uuid::Uuid;

use waypoint_audit::AuditEvent;
use waypoint_core::models::user::{normalize_email, User};
use waypoint_storage::objects::ObjectStore;
use waypoint_storage::records::{self, SessionSwap};

use crate::error::AuthError;
use crate::jwt::{TokenPair, TokenService};
use crate::password;

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Create an account. Emails are unique after normalization.
pub async fn register(
    store: &dyn ObjectStore,
    registration: Registration,
) -> Result<User, AuthError> {
    let email = normalize_email(&registration.email);
    if records::find_user_by_email(store, &email).await?.is_some() {
        return Err(AuthError::EmailTaken(email));
    }

    let password_hash = password::hash_password(&registration.password)?;
    let user = User::new(
        registration.first_name,
        registration.last_name,
        email,
        password_hash,
    );
    records::put(store, &user).await?;

    AuditEvent::new("user.register", "user", user.id)
        .by(user.id)
        .emit();
    Ok(user)
}

/// Check credentials and start a new session, replacing any previous one.
pub async fn login(
    store: &dyn ObjectStore,
    tokens: &TokenService,
    email: &str,
    password: &str,
) -> Result<TokenPair, AuthError> {
    let user = records::find_user_by_email(store, email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !password::verify_password(password, &user.password_hash)? {
        AuditEvent::new("login.rejected", "user", user.id).emit();
        return Err(AuthError::InvalidCredentials);
    }

    let pair = tokens.issue(&user)?;
    match records::swap_session_token(store, user.id, None, Some(pair.session_token.clone()))
        .await?
    {
        SessionSwap::Swapped => {}
        SessionSwap::Missing => return Err(AuthError::UserNotFound),
        SessionSwap::Stale => return Err(AuthError::SessionConflict),
    }

    AuditEvent::new("user.login", "user", user.id)
        .by(user.id)
        .emit();
    Ok(pair)
}

/// Rotate a session.
///
/// The presented token must be the user's active session token. Anything
/// else is treated as possible theft: if the token still names a real user,
/// that user's active session is revoked too. Every failure is
/// [`AuthError::SessionReuse`] or a token error, never a fresh pair.
pub async fn refresh(
    store: &dyn ObjectStore,
    tokens: &TokenService,
    presented: &str,
) -> Result<TokenPair, AuthError> {
    let Some(user) = records::find_user_by_session_token(store, presented).await? else {
        revoke_reused_session(store, tokens, presented).await?;
        return Err(AuthError::SessionReuse);
    };

    // The active token must also still be valid on its own.
    if let Err(e) = tokens.decode_session(presented) {
        records::swap_session_token(store, user.id, Some(presented), None).await?;
        info!(user_id = %user.id, "expired session token cleared");
        return Err(e);
    }

    let pair = tokens.issue(&user)?;
    match records::swap_session_token(
        store,
        user.id,
        Some(presented),
        Some(pair.session_token.clone()),
    )
    .await?
    {
        SessionSwap::Swapped => {
            debug!(user_id = %user.id, "session rotated");
            Ok(pair)
        }
        SessionSwap::Stale | SessionSwap::Missing => {
            AuditEvent::new("session.rotation_conflict", "user", user.id)
                .by(user.id)
                .emit();
            Err(AuthError::SessionReuse)
        }
    }
}

async fn revoke_reused_session(
    store: &dyn ObjectStore,
    tokens: &TokenService,
    presented: &str,
) -> Result<(), AuthError> {
    let user_id = match tokens.decode_session(presented) {
        Ok(id) => id,
        Err(e) => {
            debug!(error = %e, "unmatched session token does not decode");
            return Ok(());
        }
    };

    match records::swap_session_token(store, user_id, None, None).await? {
        SessionSwap::Swapped => {
            AuditEvent::new("session.reuse_detected", "user", user_id)
                .by(user_id)
                .emit();
        }
        SessionSwap::Missing => {
            warn!(user_id = %user_id, "reused session token names an unknown user");
        }
        SessionSwap::Stale => {
            warn!(user_id = %user_id, "session changed while revoking reused token");
        }
    }
    Ok(())
}

/// End the user's session. Later refreshes with the old cookie hit reuse
/// detection.
pub async fn logout(store: &dyn ObjectStore, user_id: Uuid) -> Result<(), AuthError> {
    match records::swap_session_token(store, user_id, None, None).await? {
        SessionSwap::Swapped => {
            AuditEvent::new("user.logout", "user", user_id)
                .by(user_id)
                .emit();
            Ok(())
        }
        SessionSwap::Missing => Err(AuthError::UserNotFound),
        SessionSwap::Stale => Err(AuthError::SessionConflict),
    }
}
