mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{cookie_request, cookie_value, empty_request, json_request, test_app};
use waypoint_core::models::user::User;
use waypoint_storage::records;

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = test_app();
    let resp = app.send(empty_request(Method::GET, "/health", None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"], "healthy");
}

#[tokio::test]
async fn register_then_login_sets_session_cookie() {
    let app = test_app();
    let resp = app.register("ada@example.com").await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.message(), "Registration successful");

    let resp = app.login("ada@example.com").await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.message(), "Login successful");
    assert!(resp.body["accessToken"].is_string());

    let cookie = resp.set_cookie().unwrap();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=None"));
    assert!(cookie.contains("Max-Age=259200"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    app.register("ada@example.com").await;

    let resp = app.register(" ADA@example.com").await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.message(), "Email already used");

    let users = records::list::<User>(app.store.as_ref()).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn registration_requires_every_field() {
    let app = test_app();
    let resp = app
        .send(json_request(
            Method::POST,
            "/auth",
            None,
            json!({ "firstName": "Ada", "email": "ada@example.com", "password": "pw" }),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.message().contains("lastName"));
}

#[tokio::test]
async fn malformed_json_uses_the_envelope() {
    let app = test_app();
    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(!resp.message().is_empty());
}

#[tokio::test]
async fn login_failures() {
    let app = test_app();
    app.register("ada@example.com").await;

    let wrong = app
        .send(json_request(
            Method::POST,
            "/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "nope" }),
        ))
        .await;
    assert_eq!(wrong.status, StatusCode::FORBIDDEN);
    assert!(wrong.set_cookie().is_none());

    let unknown = app.login("bob@example.com").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let app = test_app();

    let missing = app
        .send(empty_request(Method::GET, "/goals?userId=00000000-0000-0000-0000-000000000000", None))
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let invalid = app
        .send(empty_request(Method::GET, "/goals", Some("not-a-token")))
        .await;
    assert_eq!(invalid.status, StatusCode::FORBIDDEN);
    assert_eq!(invalid.message(), "Invalid token");
}

#[tokio::test]
async fn session_token_is_not_accepted_as_access_token() {
    let app = test_app();
    let session = app.register_and_login("ada@example.com").await;

    let resp = app
        .send(empty_request(
            Method::GET,
            &format!("/goals?userId={}", session.id),
            Some(&session.session_token),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn refresh_rotates_and_detects_reuse() {
    let app = test_app();
    let session = app.register_and_login("ada@example.com").await;

    let rotated = app
        .send(cookie_request(Method::GET, "/auth/refresh", &session.session_token))
        .await;
    assert_eq!(rotated.status, StatusCode::OK);
    assert!(rotated.body["accessToken"].is_string());
    let second = cookie_value(&rotated.set_cookie().unwrap()).unwrap();
    assert_ne!(second, session.session_token);

    // Replaying the rotated-out token is treated as theft.
    let replay = app
        .send(cookie_request(Method::GET, "/auth/refresh", &session.session_token))
        .await;
    assert_eq!(replay.status, StatusCode::FORBIDDEN);
    assert!(replay.set_cookie().unwrap().contains("Max-Age=0"));

    // The legitimate holder's current token was revoked as well.
    let revoked = app
        .send(cookie_request(Method::GET, "/auth/refresh", &second))
        .await;
    assert_eq!(revoked.status, StatusCode::FORBIDDEN);

    let user = records::get::<User>(app.store.as_ref(), session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.session_token, None);
}

#[tokio::test]
async fn refresh_without_cookie_is_unauthorized() {
    let app = test_app();
    let resp = app
        .send(empty_request(Method::GET, "/auth/refresh", None))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.message(), "No valid token");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app();
    let session = app.register_and_login("ada@example.com").await;

    let resp = app
        .send(empty_request(
            Method::POST,
            &format!("/auth/logout/{}", session.id),
            Some(&session.access_token),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.message(), "Log out successful");
    assert!(resp.set_cookie().unwrap().contains("Max-Age=0"));

    let refresh = app
        .send(cookie_request(Method::GET, "/auth/refresh", &session.session_token))
        .await;
    assert_eq!(refresh.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cannot_log_out_someone_else() {
    let app = test_app();
    let ada = app.register_and_login("ada@example.com").await;
    let bob = app.register_and_login("bob@example.com").await;

    let resp = app
        .send(empty_request(
            Method::POST,
            &format!("/auth/logout/{}", bob.id),
            Some(&ada.access_token),
        ))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}
