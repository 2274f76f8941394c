//! Core domain types
//!
//! These types mirror what the platform API reports. The harness never owns
//! their state transitions; every value here is a snapshot of remote state.

pub mod admin;
pub mod image;
pub mod job;
pub mod storage;
