use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange {
        start: jiff::civil::Date,
        end: jiff::civil::Date,
    },

    #[error("a filter is required (one of id, userId, milestoneId, goalId, date)")]
    MissingFilter,

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
}
