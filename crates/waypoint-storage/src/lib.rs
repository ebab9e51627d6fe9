//! waypoint-storage
//!
//! Object storage for Waypoint records and images. S3 in production, an
//! in-memory map for tests and local runs, and a typed record layer on top.

pub mod client;
pub mod error;
pub mod memory;
pub mod objects;
pub mod records;
pub mod s3;
pub mod state;
