use thiserror::Error;

use waypoint_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already used: {0}")]
    EmailTaken(String),

    #[error("user does not exist")]
    UserNotFound,

    #[error("invalid user credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A session token that is not the user's active session was presented.
    #[error("session token reuse detected")]
    SessionReuse,

    #[error("session changed concurrently")]
    SessionConflict,

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("auth config error: {0}")]
    Config(String),
}
