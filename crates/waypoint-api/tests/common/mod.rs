#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use waypoint_api::state::AppState;
use waypoint_auth::jwt::{TokenConfig, TokenService};
use waypoint_storage::error::StorageError;
use waypoint_storage::memory::MemoryObjectStore;
use waypoint_storage::objects::{GetObjectOutput, ObjectStore};

pub const PASSWORD: &str = "analytical-engine";
const BOUNDARY: &str = "waypoint-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Backing objects, bypassing injected faults.
    pub store: Arc<MemoryObjectStore>,
    pub faults: Arc<FaultyStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

/// A logged-in user.
pub struct Session {
    pub id: Uuid,
    pub access_token: String,
    pub session_token: String,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryObjectStore::new());
    let faults = Arc::new(FaultyStore::new(store.clone()));
    let tokens = TokenService::new(&TokenConfig::new("test-access-secret", "test-session-secret"))
        .unwrap();
    let state = AppState::new(faults.clone(), tokens, 10 * 1024 * 1024);
    TestApp {
        router: waypoint_api::router(state.clone()),
        state,
        store,
        faults,
    }
}

/// A storage failure injected under a key prefix.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    /// Every write fails.
    FailWrites(&'static str),
    /// Another writer touches the object right before each conditional write.
    RaceWrites(&'static str),
}

impl Fault {
    fn prefix(&self) -> &'static str {
        match self {
            Fault::FailWrites(prefix) | Fault::RaceWrites(prefix) => prefix,
        }
    }
}

/// Memory store that misbehaves once a [`Fault`] is injected.
pub struct FaultyStore {
    inner: Arc<MemoryObjectStore>,
    fault: Mutex<Option<Fault>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryObjectStore>) -> Self {
        Self {
            inner,
            fault: Mutex::new(None),
        }
    }

    pub fn inject(&self, fault: Fault) {
        *self.fault.lock().unwrap() = Some(fault);
    }

    fn fault_for(&self, key: &str) -> Option<Fault> {
        let fault = *self.fault.lock().unwrap();
        fault.filter(|fault| key.starts_with(fault.prefix()))
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn get_object(&self, key: &str) -> Result<GetObjectOutput, StorageError> {
        self.inner.get_object(key).await
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        if let Some(Fault::FailWrites(_)) = self.fault_for(key) {
            return Err(StorageError::PutObject(format!("injected failure for {key}")));
        }
        self.inner.put_object(key, body, content_type).await
    }

    async fn put_object_if_match(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        expected_etag: &str,
    ) -> Result<String, StorageError> {
        match self.fault_for(key) {
            Some(Fault::FailWrites(_)) => {
                return Err(StorageError::PutObject(format!("injected failure for {key}")));
            }
            Some(Fault::RaceWrites(_)) => {
                let current = self.inner.get_object(key).await?;
                self.inner
                    .put_object(key, current.body, current.content_type.as_deref())
                    .await?;
            }
            None => {}
        }
        self.inner
            .put_object_if_match(key, body, content_type, expected_etag)
            .await
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete_object(key).await
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list_objects(prefix).await
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn object_keys(&self, prefix: &str) -> Vec<String> {
        self.store.list_objects(prefix).await.unwrap()
    }

    pub async fn register(&self, email: &str) -> TestResponse {
        self.send(json_request(
            Method::POST,
            "/auth",
            None,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": email,
                "password": PASSWORD,
            }),
        ))
        .await
    }

    pub async fn login(&self, email: &str) -> TestResponse {
        self.send(json_request(
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": email, "password": PASSWORD }),
        ))
        .await
    }

    pub async fn register_and_login(&self, email: &str) -> Session {
        assert_eq!(self.register(email).await.status, StatusCode::CREATED);
        let resp = self.login(email).await;
        assert_eq!(resp.status, StatusCode::CREATED);

        let access_token = resp.body["accessToken"].as_str().unwrap().to_string();
        let session_token = cookie_value(&resp.set_cookie().unwrap()).unwrap();
        let id = self.state.tokens.verify_access(&access_token).unwrap().id;
        Session {
            id,
            access_token,
            session_token,
        }
    }

    /// POST a goal and return its id.
    pub async fn create_goal(&self, session: &Session, title: &str) -> Uuid {
        let resp = self
            .send(json_request(
                Method::POST,
                "/goals",
                Some(&session.access_token),
                json!({
                    "title": title,
                    "description": "Work through the book",
                    "startDate": "2024-01-01",
                    "endDate": "2024-06-01",
                }),
            ))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        id_of(&resp.body["goal"])
    }

    /// POST a milestone and return its id.
    pub async fn create_milestone(&self, session: &Session, goal_id: Uuid, title: &str) -> Uuid {
        let resp = self
            .send(json_request(
                Method::POST,
                "/milestones",
                Some(&session.access_token),
                json!({
                    "goalId": goal_id,
                    "title": title,
                    "description": "Chapters 1-4",
                    "endDate": "2024-02-01",
                }),
            ))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        id_of(&resp.body["milestone"])
    }

    /// POST a log with the given images and return the response.
    pub async fn create_log(
        &self,
        session: &Session,
        goal_id: Uuid,
        milestone_id: Uuid,
        date: &str,
        images: &[Part<'_>],
    ) -> TestResponse {
        let goal_id = goal_id.to_string();
        let milestone_id = milestone_id.to_string();
        let mut parts = vec![
            Part::Text("goalId", &goal_id),
            Part::Text("milestoneId", &milestone_id),
            Part::Text("title", "Read chapter 1"),
            Part::Text("description", "Ownership and borrowing"),
            Part::Text("date", date),
        ];
        parts.extend_from_slice(images);
        self.send(multipart_request(
            Method::POST,
            "/logs",
            Some(&session.access_token),
            &parts,
        ))
        .await
    }

    pub async fn get(&self, uri: &str, session: &Session) -> TestResponse {
        self.send(empty_request(Method::GET, uri, Some(&session.access_token)))
            .await
    }

    pub async fn goal(&self, session: &Session, id: Uuid) -> Value {
        let resp = self.get(&format!("/goals?id={id}"), session).await;
        assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
        resp.body["goal"].clone()
    }

    pub async fn milestone(&self, session: &Session, id: Uuid) -> Value {
        let resp = self.get(&format!("/milestones?id={id}"), session).await;
        assert_eq!(resp.status, StatusCode::OK, "{}", resp.body);
        resp.body["milestone"].clone()
    }
}

pub fn id_of(record: &Value) -> Uuid {
    record["id"].as_str().unwrap().parse().unwrap()
}

/// The `jwt` value of a `Set-Cookie` header.
pub fn cookie_value(set_cookie: &str) -> Option<String> {
    set_cookie
        .split(';')
        .next()?
        .strip_prefix("jwt=")
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    builder(method, uri, token).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    builder(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn cookie_request(method: Method, uri: &str, session_token: &str) -> Request<Body> {
    builder(method, uri, None)
        .header(COOKIE, format!("jwt={session_token}"))
        .body(Body::empty())
        .unwrap()
}

#[derive(Clone, Copy)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn image(name: &'static str, file_name: &'static str) -> Part<'static> {
    Part::File {
        name,
        file_name,
        content_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake",
    }
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    parts: &[Part<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match *part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    builder(method, uri, token)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
