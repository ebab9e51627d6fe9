pub mod auth;
pub mod goals;
pub mod health;
pub mod logs;
pub mod milestones;
pub mod users;

use uuid::Uuid;

use waypoint_core::filter::{FilterKind, FilterQuery, FilterTarget, RecordFilter};
use waypoint_core::models::goal::Goal;
use waypoint_core::models::log::Log;
use waypoint_core::models::milestone::Milestone;
use waypoint_storage::objects::ObjectStore;
use waypoint_storage::records::{self, Record};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// A record with an owning user.
pub(crate) trait Owned {
    fn owner(&self) -> Uuid;
}

impl Owned for Goal {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Milestone {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Log {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

pub(crate) async fn load_owned_goal(
    store: &dyn ObjectStore,
    user: &AuthUser,
    id: Uuid,
) -> Result<Goal, ApiError> {
    let goal = records::get::<Goal>(store, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Goal does not exist".to_string()))?;
    user.ensure_owns(goal.user_id)?;
    Ok(goal)
}

pub(crate) async fn load_owned_milestone(
    store: &dyn ObjectStore,
    user: &AuthUser,
    id: Uuid,
) -> Result<Milestone, ApiError> {
    let milestone = records::get::<Milestone>(store, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Milestone does not exist".to_string()))?;
    user.ensure_owns(milestone.user_id)?;
    Ok(milestone)
}

/// Shared read path for goals, milestones, and logs.
///
/// Resolves the query to one filter, checks the caller may read through it,
/// and treats an empty result as 404. `ById` reads are ownership-checked per
/// record and `ByDate` reads only ever see the caller's own records.
pub(crate) async fn find_owned<T>(
    store: &dyn ObjectStore,
    user: &AuthUser,
    query: &FilterQuery,
    accepted: &[FilterKind],
    what: &str,
) -> Result<(RecordFilter, Vec<T>), ApiError>
where
    T: Record + FilterTarget + Owned,
{
    let filter = query.resolve(accepted)?;

    match filter {
        RecordFilter::ByOwner(owner) => user.ensure_self(owner)?,
        RecordFilter::ByParentGoal(id) => {
            load_owned_goal(store, user, id).await?;
        }
        RecordFilter::ByParentMilestone(id) => {
            load_owned_milestone(store, user, id).await?;
        }
        RecordFilter::ById(_) | RecordFilter::ByDate(_) => {}
    }

    let mut found: Vec<T> = records::find(store, &filter).await?;
    match filter {
        RecordFilter::ById(_) => {
            for record in &found {
                user.ensure_owns(record.owner())?;
            }
        }
        RecordFilter::ByDate(_) => found.retain(|record| record.owner() == user.id),
        _ => {}
    }

    if found.is_empty() {
        return Err(ApiError::NotFound(format!("No {what} exist")));
    }
    Ok((filter, found))
}
