//! waypoint-api
//!
//! HTTP surface of Waypoint: account/session routes and ownership-checked
//! CRUD over goals, milestones, logs, and users.

use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_mw;
use axum::routing::{delete, get, post, put};
use axum::Router;

pub mod cascade;
pub mod config;
pub mod cookie;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod upload;

use config::ApiConfig;
use state::AppState;

/// All routes with authentication, audit logging, and the body size limit.
/// CORS is added by [`app`].
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout/{id}", post(routes::auth::logout))
        .route("/goals", get(routes::goals::list_goals))
        .route("/goals", post(routes::goals::create_goal))
        .route("/goals/{id}", put(routes::goals::update_goal))
        .route("/goals/{id}", delete(routes::goals::delete_goal))
        .route("/milestones", get(routes::milestones::list_milestones))
        .route("/milestones", post(routes::milestones::create_milestone))
        .route("/milestones/{id}", put(routes::milestones::update_milestone))
        .route(
            "/milestones/{id}",
            delete(routes::milestones::delete_milestone),
        )
        .route("/logs", get(routes::logs::list_logs))
        .route("/logs", post(routes::logs::create_log))
        .route("/logs/{id}", delete(routes::logs::delete_log))
        .route("/users/{id}", get(routes::users::get_user))
        .route("/users/{id}", put(routes::users::update_user))
        .route("/users/{id}", delete(routes::users::delete_user))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        // Account and session (no bearer token; refresh uses the cookie)
        .route("/auth", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", get(routes::auth::refresh))
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .with_state(state)
}

/// The deployable application: [`router`] plus credentialed CORS.
pub fn app(state: AppState, config: &ApiConfig) -> eyre::Result<Router> {
    Ok(router(state).layer(config.cors_layer()?))
}
