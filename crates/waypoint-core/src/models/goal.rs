use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;
use crate::filter::{FilterTarget, RecordFilter};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: Date,
    pub end_date: Date,
    pub counters: GoalCounters,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

/// Denormalized child counts. Maintained incrementally by the write paths,
/// never recomputed from the child records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GoalCounters {
    pub milestones: u32,
    pub finished: u32,
    pub logs: u32,
}

impl GoalCounters {
    pub fn milestone_added(&mut self) {
        self.milestones += 1;
    }

    /// A milestone and `cascaded_logs` of its logs were deleted.
    pub fn milestone_removed(&mut self, was_complete: bool, cascaded_logs: u32) {
        self.milestones = self.milestones.saturating_sub(1);
        if was_complete {
            self.finished = self.finished.saturating_sub(1);
        }
        self.logs = self.logs.saturating_sub(cascaded_logs);
    }

    pub fn milestone_finished(&mut self) {
        self.finished += 1;
    }

    pub fn milestone_resumed(&mut self) {
        self.finished = self.finished.saturating_sub(1);
    }

    pub fn log_added(&mut self) {
        self.logs += 1;
    }

    pub fn log_removed(&mut self) {
        self.logs = self.logs.saturating_sub(1);
    }
}

/// Validated input for a new goal.
#[derive(Debug, Clone)]
pub struct GoalDraft {
    pub title: String,
    pub description: String,
    pub start_date: Date,
    pub end_date: Date,
}

/// Field changes for an existing goal. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl Goal {
    pub fn create(user_id: Uuid, draft: GoalDraft) -> Result<Self, CoreError> {
        check_date_range(draft.start_date, draft.end_date)?;
        let now = jiff::Timestamp::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            title: draft.title,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            counters: GoalCounters::default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a patch. The goal is left untouched if the result would have an
    /// end date before its start date.
    pub fn apply(&mut self, patch: GoalPatch) -> Result<(), CoreError> {
        let start = patch.start_date.unwrap_or(self.start_date);
        let end = patch.end_date.unwrap_or(self.end_date);
        check_date_range(start, end)?;

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.start_date = start;
        self.end_date = end;
        self.updated_at = jiff::Timestamp::now();
        Ok(())
    }
}

fn check_date_range(start: Date, end: Date) -> Result<(), CoreError> {
    if end < start {
        return Err(CoreError::InvalidDateRange { start, end });
    }
    Ok(())
}

impl FilterTarget for Goal {
    fn matches(&self, filter: &RecordFilter) -> bool {
        match *filter {
            RecordFilter::ById(id) => self.id == id,
            RecordFilter::ByOwner(owner) => self.user_id == owner,
            _ => false,
        }
    }
}
