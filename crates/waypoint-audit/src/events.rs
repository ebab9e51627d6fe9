use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// A structured audit event for logging API actions.
///
/// Events are logged via `tracing` so they land in the same JSON log stream
/// as request logs. Security events (`session.*` failures) log at `warn`.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl ToString,
    ) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.to_string(),
            user_id: None,
            details: None,
        }
    }

    pub fn by(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Security-relevant events are the ones operators should alert on.
    pub fn is_security(&self) -> bool {
        matches!(
            self.action.as_str(),
            "session.reuse_detected" | "session.rotation_conflict" | "login.rejected"
        )
    }

    /// Emit this audit event via tracing.
    pub fn emit(&self) {
        let user_id = self.user_id.map(|id| id.to_string()).unwrap_or_default();
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();

        if self.is_security() {
            warn!(
                audit.action = %self.action,
                audit.resource_type = %self.resource_type,
                audit.resource_id = %self.resource_id,
                audit.user_id = %user_id,
                audit.details = %details,
                "security audit event"
            );
        } else {
            info!(
                audit.action = %self.action,
                audit.resource_type = %self.resource_type,
                audit.resource_id = %self.resource_id,
                audit.user_id = %user_id,
                audit.details = %details,
                "audit event"
            );
        }
    }
}
