pub mod goal;
pub mod log;
pub mod milestone;
pub mod user;
