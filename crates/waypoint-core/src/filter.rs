//! Record filters for list reads.
//!
//! Query strings carry at most one meaningful key. [`FilterQuery::resolve`]
//! turns them into a single [`RecordFilter`] at the HTTP boundary so storage
//! and handlers never inspect raw query keys.

use std::fmt;

use jiff::civil::Date;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    ById(Uuid),
    ByOwner(Uuid),
    ByParentGoal(Uuid),
    ByParentMilestone(Uuid),
    ByDate(Date),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Id,
    Owner,
    ParentGoal,
    ParentMilestone,
    Date,
}

impl RecordFilter {
    pub fn kind(&self) -> FilterKind {
        match self {
            RecordFilter::ById(_) => FilterKind::Id,
            RecordFilter::ByOwner(_) => FilterKind::Owner,
            RecordFilter::ByParentGoal(_) => FilterKind::ParentGoal,
            RecordFilter::ByParentMilestone(_) => FilterKind::ParentMilestone,
            RecordFilter::ByDate(_) => FilterKind::Date,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Query-string key names.
        let key = match self {
            FilterKind::Id => "id",
            FilterKind::Owner => "userId",
            FilterKind::ParentGoal => "goalId",
            FilterKind::ParentMilestone => "milestoneId",
            FilterKind::Date => "date",
        };
        f.write_str(key)
    }
}

/// Raw list-read query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub goal_id: Option<Uuid>,
    pub milestone_id: Option<Uuid>,
    pub date: Option<Date>,
}

impl FilterQuery {
    /// Pick the filter to apply.
    ///
    /// Precedence is `id`, `userId`, `milestoneId`, `goalId`, `date`. The
    /// chosen filter must be one of `accepted`.
    pub fn resolve(&self, accepted: &[FilterKind]) -> Result<RecordFilter, CoreError> {
        let filter = if let Some(id) = self.id {
            RecordFilter::ById(id)
        } else if let Some(owner) = self.user_id {
            RecordFilter::ByOwner(owner)
        } else if let Some(milestone) = self.milestone_id {
            RecordFilter::ByParentMilestone(milestone)
        } else if let Some(goal) = self.goal_id {
            RecordFilter::ByParentGoal(goal)
        } else if let Some(date) = self.date {
            RecordFilter::ByDate(date)
        } else {
            return Err(CoreError::MissingFilter);
        };

        if !accepted.contains(&filter.kind()) {
            return Err(CoreError::UnsupportedFilter(filter.kind().to_string()));
        }
        Ok(filter)
    }
}

/// A record that can be tested against a [`RecordFilter`].
///
/// Filters that do not apply to a record type never match it.
pub trait FilterTarget {
    fn matches(&self, filter: &RecordFilter) -> bool;
}
