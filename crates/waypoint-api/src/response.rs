use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Successful response: `{message, ...payload}`.
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    payload: T,
}

/// Payload for message-only responses.
#[derive(Serialize)]
pub struct NoPayload {}

#[derive(Serialize)]
struct Envelope<'a, T> {
    message: &'a str,
    #[serde(flatten)]
    payload: &'a T,
}

impl ApiResponse<NoPayload> {
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: NoPayload {},
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// 200, for reads.
    pub fn ok(message: impl Into<String>, payload: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            payload,
        }
    }

    /// 201, for every write (creates, updates, and deletes alike).
    pub fn created(message: impl Into<String>, payload: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            payload,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            message: &self.message,
            payload: &self.payload,
        };
        (self.status, Json(body)).into_response()
    }
}
