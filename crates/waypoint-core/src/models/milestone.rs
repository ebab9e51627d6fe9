use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::filter::{FilterTarget, RecordFilter};
use crate::models::goal::Goal;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_id: Uuid,
    pub title: String,
    pub description: String,
    pub end_date: Date,
    pub is_complete: bool,
    pub log_count: u32,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

/// Completion transitions selected by the `edit` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneEdit {
    /// incomplete → complete
    Finish,
    /// complete → incomplete
    Resume,
}

#[derive(Debug, Clone)]
pub struct MilestoneDraft {
    pub goal_id: Uuid,
    pub title: String,
    pub description: String,
    pub end_date: Date,
}

#[derive(Debug, Clone, Default)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub end_date: Option<Date>,
}

impl Milestone {
    pub fn create(user_id: Uuid, draft: MilestoneDraft) -> Self {
        let now = jiff::Timestamp::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            goal_id: draft.goal_id,
            title: draft.title,
            description: draft.description,
            end_date: draft.end_date,
            is_complete: false,
            log_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same title and end date under the same goal.
    pub fn duplicates(&self, draft: &MilestoneDraft) -> bool {
        self.goal_id == draft.goal_id
            && self.title == draft.title
            && self.end_date == draft.end_date
    }

    /// Plain field edit. Never touches the completion flag.
    pub fn apply(&mut self, patch: MilestonePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        self.updated_at = jiff::Timestamp::now();
    }

    /// Run a completion transition, keeping the parent goal's finished
    /// counter in step. Returns `false` when the milestone was already in the
    /// target state, in which case neither record changed.
    pub fn transition(&mut self, edit: MilestoneEdit, goal: &mut Goal) -> bool {
        debug_assert_eq!(self.goal_id, goal.id);
        let changed = match edit {
            MilestoneEdit::Finish if !self.is_complete => {
                self.is_complete = true;
                goal.counters.milestone_finished();
                true
            }
            MilestoneEdit::Resume if self.is_complete => {
                self.is_complete = false;
                goal.counters.milestone_resumed();
                true
            }
            _ => false,
        };

        if changed {
            let now = jiff::Timestamp::now();
            self.updated_at = now;
            goal.updated_at = now;
        }
        changed
    }

    pub fn log_added(&mut self) {
        self.log_count += 1;
    }

    pub fn log_removed(&mut self) {
        self.log_count = self.log_count.saturating_sub(1);
    }
}

impl FilterTarget for Milestone {
    fn matches(&self, filter: &RecordFilter) -> bool {
        match *filter {
            RecordFilter::ById(id) => self.id == id,
            RecordFilter::ByOwner(owner) => self.user_id == owner,
            RecordFilter::ByParentGoal(goal) => self.goal_id == goal,
            _ => false,
        }
    }
}
