use std::fmt;

use jiff::SignedDuration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypoint_core::models::user::User;

use crate::error::AuthError;

pub const DEFAULT_ACCESS_TTL: SignedDuration = SignedDuration::from_hours(24);
pub const DEFAULT_SESSION_TTL: SignedDuration = SignedDuration::from_hours(72);

/// Secrets and lifetimes for both token classes.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub session_secret: String,
    pub access_ttl: SignedDuration,
    pub session_ttl: SignedDuration,
}

impl TokenConfig {
    pub fn new(access_secret: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            session_secret: session_secret.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// Identity carried by an access token and attached to authenticated
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessIdentity {
    pub first_name: String,
    pub last_name: String,
    pub id: Uuid,
    pub profile_picture: Option<String>,
}

impl From<&User> for AccessIdentity {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            id: user.id,
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    #[serde(rename = "userData")]
    user_data: AccessIdentity,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionSubject {
    id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(rename = "userData")]
    user_data: SessionSubject,
    /// Makes every issued session token unique, even within one second.
    jti: Uuid,
    iat: i64,
    exp: i64,
}

/// A freshly issued access + session token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub session_token: String,
}

/// Issues and validates HS256 access and session tokens.
///
/// The two token classes are signed with different secrets, so a session
/// token never verifies as an access token and vice versa.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    session_encoding: EncodingKey,
    session_decoding: DecodingKey,
    access_ttl: SignedDuration,
    session_ttl: SignedDuration,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Result<Self, AuthError> {
        if config.access_secret.is_empty() || config.session_secret.is_empty() {
            return Err(AuthError::Config("token secrets must not be empty".to_string()));
        }
        if config.access_secret == config.session_secret {
            return Err(AuthError::Config(
                "access and session token secrets must differ".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            session_encoding: EncodingKey::from_secret(config.session_secret.as_bytes()),
            session_decoding: DecodingKey::from_secret(config.session_secret.as_bytes()),
            access_ttl: config.access_ttl,
            session_ttl: config.session_ttl,
            validation,
        })
    }

    pub fn session_ttl(&self) -> SignedDuration {
        self.session_ttl
    }

    /// Issue both tokens for a user (login and refresh).
    pub fn issue(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(user)?,
            session_token: self.issue_session(user.id)?,
        })
    }

    pub fn issue_access(&self, user: &User) -> Result<String, AuthError> {
        let iat = jiff::Timestamp::now().as_second();
        let claims = AccessClaims {
            user_data: AccessIdentity::from(user),
            iat,
            exp: iat + self.access_ttl.as_secs(),
        };
        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    pub fn issue_session(&self, user_id: Uuid) -> Result<String, AuthError> {
        let iat = jiff::Timestamp::now().as_second();
        let claims = SessionClaims {
            user_data: SessionSubject { id: user_id },
            jti: Uuid::new_v4(),
            iat,
            exp: iat + self.session_ttl.as_secs(),
        };
        Ok(encode(&Header::default(), &claims, &self.session_encoding)?)
    }

    /// Validate signature and expiry of an access token. No store access.
    pub fn verify_access(&self, token: &str) -> Result<AccessIdentity, AuthError> {
        decode::<AccessClaims>(token, &self.access_decoding, &self.validation)
            .map(|data| data.claims.user_data)
            .map_err(token_error)
    }

    /// Validate a session token and return the user id it names.
    pub fn decode_session(&self, token: &str) -> Result<Uuid, AuthError> {
        decode::<SessionClaims>(token, &self.session_decoding, &self.validation)
            .map(|data| data.claims.user_data.id)
            .map_err(token_error)
    }
}

fn token_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
        )
    }

    fn service() -> TokenService {
        TokenService::new(&TokenConfig::new("access-secret", "session-secret")).unwrap()
    }

    #[test]
    fn access_token_carries_identity() {
        let user = user();
        let tokens = service();
        let token = tokens.issue_access(&user).unwrap();

        let identity = tokens.verify_access(&token).unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.first_name, "Ada");
        assert_eq!(identity.profile_picture, None);
    }

    #[test]
    fn session_token_is_not_an_access_token() {
        let user = user();
        let tokens = service();
        let pair = tokens.issue(&user).unwrap();

        assert!(matches!(
            tokens.verify_access(&pair.session_token),
            Err(AuthError::InvalidToken(_))
        ));
        assert_eq!(tokens.decode_session(&pair.session_token).unwrap(), user.id);
    }

    #[test]
    fn session_tokens_are_unique() {
        let tokens = service();
        let id = Uuid::new_v4();
        assert_ne!(
            tokens.issue_session(id).unwrap(),
            tokens.issue_session(id).unwrap()
        );
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let mut config = TokenConfig::new("access-secret", "session-secret");
        config.access_ttl = SignedDuration::from_hours(-2);
        let tokens = TokenService::new(&config).unwrap();

        let token = tokens.issue_access(&user()).unwrap();
        assert!(matches!(
            tokens.verify_access(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = service();
        let other = TokenService::new(&TokenConfig::new("other-access", "other-session")).unwrap();
        let forged = other.issue_access(&user()).unwrap();
        assert!(tokens.verify_access(&forged).is_err());
        assert!(tokens.verify_access("not.a.jwt").is_err());
    }

    #[test]
    fn secrets_must_differ_and_be_present() {
        assert!(matches!(
            TokenService::new(&TokenConfig::new("same", "same")),
            Err(AuthError::Config(_))
        ));
        assert!(matches!(
            TokenService::new(&TokenConfig::new("", "session")),
            Err(AuthError::Config(_))
        ));
    }
}
