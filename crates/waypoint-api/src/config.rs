use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use jiff::SignedDuration;
use tower_http::cors::CorsLayer;

use waypoint_auth::jwt::{TokenConfig, DEFAULT_ACCESS_TTL, DEFAULT_SESSION_TTL};

const DEFAULT_BUCKET: &str = "waypoint";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    /// Process-local; data is lost on exit.
    Memory,
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bucket: String,
    pub storage: StorageBackend,
    pub tokens: TokenConfig,
    pub cors_origin: String,
    /// Serve on this address instead of running as a Lambda function.
    pub listen_addr: Option<SocketAddr>,
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let access_secret = lookup("JWT_ACCESS_KEY_SECRET")
            .ok_or_else(|| eyre::eyre!("JWT_ACCESS_KEY_SECRET is not set"))?;
        let session_secret = lookup("JWT_REFRESH_KEY_SECRET")
            .ok_or_else(|| eyre::eyre!("JWT_REFRESH_KEY_SECRET is not set"))?;

        let storage = match lookup("WAYPOINT_STORAGE").as_deref() {
            None | Some("s3") => StorageBackend::S3,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(eyre::eyre!(
                    "WAYPOINT_STORAGE must be \"s3\" or \"memory\", got {other:?}"
                ));
            }
        };

        let tokens = TokenConfig {
            access_secret,
            session_secret,
            access_ttl: duration_secs(&lookup, "WAYPOINT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL)?,
            session_ttl: duration_secs(&lookup, "WAYPOINT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL)?,
        };

        let listen_addr = lookup("WAYPOINT_LISTEN_ADDR")
            .map(|addr| {
                addr.parse::<SocketAddr>()
                    .map_err(|e| eyre::eyre!("invalid WAYPOINT_LISTEN_ADDR {addr:?}: {e}"))
            })
            .transpose()?;

        let max_upload_bytes = match lookup("WAYPOINT_MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| eyre::eyre!("invalid WAYPOINT_MAX_UPLOAD_BYTES {raw:?}: {e}"))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            bucket: lookup("WAYPOINT_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            storage,
            tokens,
            cors_origin: lookup("WAYPOINT_CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            listen_addr,
            max_upload_bytes,
        })
    }

    /// CORS for a single browser origin that sends the session cookie.
    pub fn cors_layer(&self) -> eyre::Result<CorsLayer> {
        let origin = HeaderValue::from_str(&self.cors_origin)
            .map_err(|e| eyre::eyre!("invalid WAYPOINT_CORS_ORIGIN: {e}"))?;
        Ok(CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
    }
}

fn duration_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: SignedDuration,
) -> eyre::Result<SignedDuration> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let secs = raw
        .parse::<i64>()
        .map_err(|e| eyre::eyre!("invalid {key} {raw:?}: {e}"))?;
    if secs <= 0 {
        return Err(eyre::eyre!("{key} must be positive, got {secs}"));
    }
    Ok(SignedDuration::from_secs(secs))
}
