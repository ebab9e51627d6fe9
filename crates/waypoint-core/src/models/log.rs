use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::filter::{FilterTarget, RecordFilter};

/// A dated progress entry attached to a milestone.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub milestone_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: Date,
    /// Object keys of uploaded images.
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

#[derive(Debug, Clone)]
pub struct LogDraft {
    pub goal_id: Uuid,
    pub milestone_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: Date,
}

impl Log {
    pub fn create(user_id: Uuid, draft: LogDraft, images: Vec<String>) -> Self {
        let now = jiff::Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            goal_id: draft.goal_id,
            milestone_id: draft.milestone_id,
            title: draft.title,
            description: draft.description,
            date: draft.date,
            images,
            created_at: now,
            updated_at: now,
        }
    }
}

impl FilterTarget for Log {
    fn matches(&self, filter: &RecordFilter) -> bool {
        match *filter {
            RecordFilter::ById(id) => self.id == id,
            RecordFilter::ByOwner(owner) => self.user_id == owner,
            RecordFilter::ByParentGoal(goal) => self.goal_id == goal,
            RecordFilter::ByParentMilestone(milestone) => self.milestone_id == milestone,
            RecordFilter::ByDate(date) => self.date == date,
        }
    }
}
