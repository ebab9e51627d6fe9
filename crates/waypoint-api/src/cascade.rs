//! Cascading deletes. Children are removed before their parent.

use tracing::info;

use waypoint_core::filter::RecordFilter;
use waypoint_core::keys;
use waypoint_core::models::goal::Goal;
use waypoint_core::models::log::Log;
use waypoint_core::models::milestone::Milestone;
use waypoint_core::models::user::User;
use waypoint_storage::error::StorageError;
use waypoint_storage::objects::ObjectStore;
use waypoint_storage::records;

use crate::upload;

/// Delete a log and the images it references.
pub async fn delete_log_record(store: &dyn ObjectStore, log: &Log) -> Result<(), StorageError> {
    upload::delete_images(store, &log.images).await?;
    records::delete::<Log>(store, log.id).await
}

/// Delete every log under a milestone. Returns how many were removed.
pub async fn delete_milestone_logs(
    store: &dyn ObjectStore,
    milestone: &Milestone,
) -> Result<u32, StorageError> {
    let logs: Vec<Log> =
        records::find(store, &RecordFilter::ByParentMilestone(milestone.id)).await?;
    for log in &logs {
        delete_log_record(store, log).await?;
    }
    Ok(logs.len() as u32)
}

/// Delete a goal with all of its milestones and logs.
pub async fn delete_goal_tree(store: &dyn ObjectStore, goal: &Goal) -> Result<(), StorageError> {
    let filter = RecordFilter::ByParentGoal(goal.id);

    let logs: Vec<Log> = records::find(store, &filter).await?;
    for log in &logs {
        delete_log_record(store, log).await?;
    }

    let milestones: Vec<Milestone> = records::find(store, &filter).await?;
    for milestone in &milestones {
        records::delete::<Milestone>(store, milestone.id).await?;
    }

    records::delete::<Goal>(store, goal.id).await?;
    info!(
        goal_id = %goal.id,
        milestones = milestones.len(),
        logs = logs.len(),
        "goal deleted with children"
    );
    Ok(())
}

/// Delete a user and everything they own, including stored images.
pub async fn delete_user_tree(store: &dyn ObjectStore, user: &User) -> Result<(), StorageError> {
    let owner = RecordFilter::ByOwner(user.id);

    let goals: Vec<Goal> = records::find(store, &owner).await?;
    for goal in &goals {
        delete_goal_tree(store, goal).await?;
    }

    // Anything left over from a previously interrupted cascade.
    let logs: Vec<Log> = records::find(store, &owner).await?;
    for log in &logs {
        records::delete::<Log>(store, log.id).await?;
    }
    let milestones: Vec<Milestone> = records::find(store, &owner).await?;
    for milestone in &milestones {
        records::delete::<Milestone>(store, milestone.id).await?;
    }

    let images = store
        .delete_objects_by_prefix(&keys::images_prefix(user.id))
        .await?;

    records::delete::<User>(store, user.id).await?;
    info!(user_id = %user.id, goals = goals.len(), images, "user deleted with owned records");
    Ok(())
}
