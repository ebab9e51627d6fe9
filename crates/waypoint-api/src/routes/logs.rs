use std::fmt::Display;
use std::str::FromStr;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use waypoint_audit::AuditEvent;
use waypoint_core::filter::{FilterKind, FilterQuery, RecordFilter};
use waypoint_core::models::goal::Goal;
use waypoint_core::models::log::{Log, LogDraft};
use waypoint_core::models::milestone::Milestone;
use waypoint_core::validate::{required, required_text};
use waypoint_storage::records;

use crate::cascade;
use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, NoPayload};
use crate::routes::{find_owned, load_owned_goal, load_owned_milestone};
use crate::state::AppState;
use crate::upload::{self, ApiMultipart, MultipartForm};

const FILTERS: &[FilterKind] = &[
    FilterKind::Id,
    FilterKind::Owner,
    FilterKind::ParentGoal,
    FilterKind::ParentMilestone,
    FilterKind::Date,
];

/// Multipart part name for log images.
pub const IMAGE_FIELD: &str = "images";
pub const MAX_IMAGES: usize = 3;

#[derive(Serialize)]
pub struct LogPayload {
    pub log: Log,
}

#[derive(Serialize)]
pub struct LogsPayload {
    pub logs: Vec<Log>,
}

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<Response, ApiError> {
    let (filter, mut logs) = find_owned::<Log>(state.store(), &user, &query, FILTERS, "logs").await?;

    if let RecordFilter::ById(_) = filter
        && let Some(log) = logs.pop()
    {
        return Ok(ApiResponse::ok("Log found", LogPayload { log }).into_response());
    }
    Ok(ApiResponse::ok("Logs found", LogsPayload { logs }).into_response())
}

/// Multipart form: `goalId`, `milestoneId`, `title`, `description`, `date`,
/// and up to [`MAX_IMAGES`] `images` parts.
pub async fn create_log(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<ApiResponse<LogPayload>, ApiError> {
    let mut form = MultipartForm::read(multipart, IMAGE_FIELD, MAX_IMAGES).await?;
    let draft = LogDraft {
        goal_id: parse_field(&mut form, "goalId")?,
        milestone_id: parse_field(&mut form, "milestoneId")?,
        title: required_text(form.take("title"), "title")?,
        description: required_text(form.take("description"), "description")?,
        date: parse_field(&mut form, "date")?,
    };

    let mut goal = load_owned_goal(state.store(), &user, draft.goal_id).await?;
    let mut milestone = load_owned_milestone(state.store(), &user, draft.milestone_id).await?;
    if milestone.goal_id != goal.id {
        return Err(ApiError::BadRequest(
            "Milestone does not belong to goal".to_string(),
        ));
    }

    let images = upload::store_images(state.store(), user.id, form.images).await?;
    let log = Log::create(user.id, draft, images);
    if let Err(e) = records::put(state.store(), &log).await {
        upload::discard_images(state.store(), &log.images).await;
        return Err(e.into());
    }

    let now = jiff::Timestamp::now();
    milestone.log_added();
    milestone.updated_at = now;
    records::put(state.store(), &milestone).await?;
    goal.counters.log_added();
    goal.updated_at = now;
    records::put(state.store(), &goal).await?;

    AuditEvent::new("log.create", "log", log.id)
        .by(user.id)
        .with_details(serde_json::json!({ "images": log.images.len() }))
        .emit();
    Ok(ApiResponse::created("Log created", LogPayload { log }))
}

pub async fn delete_log(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<NoPayload>, ApiError> {
    let log = records::get::<Log>(state.store(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Log does not exist".to_string()))?;
    user.ensure_owns(log.user_id)?;

    cascade::delete_log_record(state.store(), &log).await?;

    let now = jiff::Timestamp::now();
    if let Some(mut milestone) = records::get::<Milestone>(state.store(), log.milestone_id).await? {
        milestone.log_removed();
        milestone.updated_at = now;
        records::put(state.store(), &milestone).await?;
    }
    if let Some(mut goal) = records::get::<Goal>(state.store(), log.goal_id).await? {
        goal.counters.log_removed();
        goal.updated_at = now;
        records::put(state.store(), &goal).await?;
    }

    AuditEvent::new("log.delete", "log", log.id)
        .by(user.id)
        .emit();
    Ok(ApiResponse::created("Log deleted", NoPayload {}))
}

fn parse_field<T>(form: &mut MultipartForm, name: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = required(form.take(name), name)?;
    raw.trim()
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid {name}: {e}")))
}
