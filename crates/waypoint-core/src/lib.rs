//! waypoint-core
//!
//! Pure domain types, record filters, and object key conventions.
//! No AWS SDK dependency. This is the shared vocabulary of the Waypoint system.

pub mod error;
pub mod filter;
pub mod keys;
pub mod models;
pub mod validate;
