use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use waypoint_audit::AuditEvent;
use waypoint_core::filter::{FilterKind, FilterQuery, RecordFilter};
use waypoint_core::models::goal::Goal;
use waypoint_core::models::milestone::{Milestone, MilestoneDraft, MilestoneEdit, MilestonePatch};
use waypoint_core::validate::{optional_text, required, required_text};
use waypoint_storage::objects::ObjectStore;
use waypoint_storage::records;

use crate::cascade;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, NoPayload};
use crate::routes::{find_owned, load_owned_goal, load_owned_milestone};
use crate::state::AppState;

const FILTERS: &[FilterKind] = &[FilterKind::Id, FilterKind::Owner, FilterKind::ParentGoal];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneRequest {
    pub goal_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub edit: Option<MilestoneEdit>,
}

#[derive(Serialize)]
pub struct MilestonePayload {
    pub milestone: Milestone,
}

#[derive(Serialize)]
pub struct MilestonesPayload {
    pub milestones: Vec<Milestone>,
}

pub async fn list_milestones(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<Response, ApiError> {
    let (filter, mut milestones) =
        find_owned::<Milestone>(state.store(), &user, &query, FILTERS, "milestones").await?;

    if let RecordFilter::ById(_) = filter
        && let Some(milestone) = milestones.pop()
    {
        return Ok(
            ApiResponse::ok("Milestone found", MilestonePayload { milestone }).into_response(),
        );
    }
    Ok(ApiResponse::ok("Milestones found", MilestonesPayload { milestones }).into_response())
}

pub async fn create_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<MilestoneRequest>,
) -> Result<ApiResponse<MilestonePayload>, ApiError> {
    let draft = MilestoneDraft {
        goal_id: required(req.goal_id, "goalId")?,
        title: required_text(req.title, "title")?,
        description: required_text(req.description, "description")?,
        end_date: required(req.end_date, "endDate")?,
    };

    let mut goal = load_owned_goal(state.store(), &user, draft.goal_id).await?;

    let siblings: Vec<Milestone> =
        records::find(state.store(), &RecordFilter::ByParentGoal(goal.id)).await?;
    if siblings.iter().any(|m| m.duplicates(&draft)) {
        return Err(ApiError::Conflict("Milestone already exists".to_string()));
    }

    let milestone = Milestone::create(user.id, draft);
    records::put(state.store(), &milestone).await?;

    goal.counters.milestone_added();
    goal.updated_at = jiff::Timestamp::now();
    records::put(state.store(), &goal).await?;

    AuditEvent::new("milestone.create", "milestone", milestone.id)
        .by(user.id)
        .emit();
    Ok(ApiResponse::created(
        "Milestone created",
        MilestonePayload { milestone },
    ))
}

/// `?edit=finish` and `?edit=resume` toggle completion; without `edit` the
/// JSON body is a plain field edit.
pub async fn update_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<EditQuery>,
    body: Bytes,
) -> Result<ApiResponse<MilestonePayload>, ApiError> {
    let mut milestone = load_owned_milestone(state.store(), &user, id).await?;

    let Some(edit) = query.edit else {
        let req: MilestoneRequest = if body.is_empty() {
            MilestoneRequest::default()
        } else {
            serde_json::from_slice(&body)?
        };
        milestone.apply(MilestonePatch {
            title: optional_text(req.title),
            description: optional_text(req.description),
            end_date: req.end_date,
        });
        records::put(state.store(), &milestone).await?;

        AuditEvent::new("milestone.update", "milestone", milestone.id)
            .by(user.id)
            .emit();
        return Ok(ApiResponse::created(
            "Milestone edited successfully",
            MilestonePayload { milestone },
        ));
    };

    let mut goal = parent_goal(state.store(), &milestone).await?;
    if milestone.transition(edit, &mut goal) {
        records::put(state.store(), &milestone).await?;
        records::put(state.store(), &goal).await?;
        AuditEvent::new("milestone.transition", "milestone", milestone.id)
            .by(user.id)
            .with_details(serde_json::json!({ "isComplete": milestone.is_complete }))
            .emit();
    }

    let message = match edit {
        MilestoneEdit::Finish => "Milestone set to complete",
        MilestoneEdit::Resume => "Milestone set to incomplete",
    };
    Ok(ApiResponse::created(message, MilestonePayload { milestone }))
}

pub async fn delete_milestone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<NoPayload>, ApiError> {
    let milestone = load_owned_milestone(state.store(), &user, id).await?;
    let removed_logs = cascade::delete_milestone_logs(state.store(), &milestone).await?;

    let mut goal = parent_goal(state.store(), &milestone).await?;
    goal.counters.milestone_removed(milestone.is_complete, removed_logs);
    goal.updated_at = jiff::Timestamp::now();
    records::put(state.store(), &goal).await?;

    records::delete::<Milestone>(state.store(), milestone.id).await?;

    AuditEvent::new("milestone.delete", "milestone", milestone.id)
        .by(user.id)
        .with_details(serde_json::json!({ "logs": removed_logs }))
        .emit();
    Ok(ApiResponse::created("Milestone deleted", NoPayload {}))
}

async fn parent_goal(store: &dyn ObjectStore, milestone: &Milestone) -> Result<Goal, ApiError> {
    records::get::<Goal>(store, milestone.goal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Goal does not exist".to_string()))
}
