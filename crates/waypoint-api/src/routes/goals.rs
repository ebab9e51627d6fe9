use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypoint_audit::AuditEvent;
use waypoint_core::filter::{FilterKind, FilterQuery, RecordFilter};
use waypoint_core::models::goal::{Goal, GoalDraft, GoalPatch};
use waypoint_core::validate::{optional_text, required, required_text};
use waypoint_storage::records;

use crate::cascade;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, NoPayload};
use crate::routes::{find_owned, load_owned_goal};
use crate::state::AppState;

const FILTERS: &[FilterKind] = &[FilterKind::Id, FilterKind::Owner];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Serialize)]
pub struct GoalPayload {
    pub goal: Goal,
}

#[derive(Serialize)]
pub struct GoalsPayload {
    pub goals: Vec<Goal>,
}

pub async fn list_goals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<Response, ApiError> {
    let (filter, mut goals) =
        find_owned::<Goal>(state.store(), &user, &query, FILTERS, "goals").await?;

    if let RecordFilter::ById(_) = filter
        && let Some(goal) = goals.pop()
    {
        return Ok(ApiResponse::ok("Goal found", GoalPayload { goal }).into_response());
    }
    Ok(ApiResponse::ok("Goals found", GoalsPayload { goals }).into_response())
}

pub async fn create_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<GoalRequest>,
) -> Result<ApiResponse<GoalPayload>, ApiError> {
    let draft = GoalDraft {
        title: required_text(req.title, "title")?,
        description: required_text(req.description, "description")?,
        start_date: required(req.start_date, "startDate")?,
        end_date: required(req.end_date, "endDate")?,
    };

    ensure_title_free(&state, user.id, &draft.title, None).await?;

    let goal = Goal::create(user.id, draft)?;
    records::put(state.store(), &goal).await?;

    AuditEvent::new("goal.create", "goal", goal.id)
        .by(user.id)
        .emit();
    Ok(ApiResponse::created("Goal created", GoalPayload { goal }))
}

pub async fn update_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<GoalRequest>,
) -> Result<ApiResponse<GoalPayload>, ApiError> {
    let mut goal = load_owned_goal(state.store(), &user, id).await?;

    let patch = GoalPatch {
        title: optional_text(req.title),
        description: optional_text(req.description),
        start_date: req.start_date,
        end_date: req.end_date,
    };
    if let Some(title) = &patch.title
        && *title != goal.title
    {
        ensure_title_free(&state, user.id, title, Some(goal.id)).await?;
    }

    goal.apply(patch)?;
    records::put(state.store(), &goal).await?;

    AuditEvent::new("goal.update", "goal", goal.id)
        .by(user.id)
        .emit();
    Ok(ApiResponse::created("Goal edited", GoalPayload { goal }))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<NoPayload>, ApiError> {
    let goal = load_owned_goal(state.store(), &user, id).await?;
    cascade::delete_goal_tree(state.store(), &goal).await?;

    AuditEvent::new("goal.delete", "goal", goal.id)
        .by(user.id)
        .emit();
    Ok(ApiResponse::created("Goal deleted", NoPayload {}))
}

/// Goal titles are unique per owner.
async fn ensure_title_free(
    state: &AppState,
    owner: Uuid,
    title: &str,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    let goals: Vec<Goal> = records::find(state.store(), &RecordFilter::ByOwner(owner)).await?;
    if goals
        .iter()
        .any(|goal| goal.title == title && Some(goal.id) != except)
    {
        return Err(ApiError::Conflict("Goal already exists".to_string()));
    }
    Ok(())
}
