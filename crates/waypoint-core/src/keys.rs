//! Object key conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the canonical
//! layout of records and uploaded images in the Waypoint bucket.

use uuid::Uuid;

pub const USERS_PREFIX: &str = "users/";
pub const GOALS_PREFIX: &str = "goals/";
pub const MILESTONES_PREFIX: &str = "milestones/";
pub const LOGS_PREFIX: &str = "logs/";

pub fn user(id: Uuid) -> String {
    format!("{USERS_PREFIX}{id}.json")
}

pub fn goal(id: Uuid) -> String {
    format!("{GOALS_PREFIX}{id}.json")
}

pub fn milestone(id: Uuid) -> String {
    format!("{MILESTONES_PREFIX}{id}.json")
}

pub fn log(id: Uuid) -> String {
    format!("{LOGS_PREFIX}{id}.json")
}

pub fn images_prefix(owner: Uuid) -> String {
    format!("images/{owner}/")
}

/// Key for an uploaded image. The file name is reduced to a safe subset so
/// client-supplied names cannot introduce extra path segments.
pub fn image(owner: Uuid, id: Uuid, file_name: &str) -> String {
    format!("images/{owner}/{id}-{}", sanitize_file_name(file_name))
}

fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
