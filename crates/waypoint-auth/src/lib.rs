//! waypoint-auth
//!
//! Access/session tokens, password hashing, and the account flows built on
//! them (register, login, refresh with reuse detection, logout).

pub mod error;
pub mod flows;
pub mod jwt;
pub mod password;
