//! Required-field checks shared by request bodies and multipart forms.

use crate::error::CoreError;

/// Require a value to be present.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, CoreError> {
    value.ok_or_else(|| CoreError::MissingField(field.to_string()))
}

/// Require a text value to be present and non-blank. Returns the trimmed text.
pub fn required_text(value: Option<String>, field: &str) -> Result<String, CoreError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(CoreError::MissingField(field.to_string())),
    }
}

/// Normalize an optional text patch: blank values are treated as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
