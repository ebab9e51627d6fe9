//! waypoint-audit
//!
//! Structured audit events for account, session, and record changes.

pub mod events;

pub use events::AuditEvent;
