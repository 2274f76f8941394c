//! Data Transfer Objects
//!
//! Request payloads and query filters sent to the platform API.

pub mod admin;
pub mod blob;
pub mod job;
