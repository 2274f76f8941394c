//! E2E Core
//!
//! Shared types for the platform end-to-end harness.
//!
//! This crate contains:
//! - Domain types: platform entities observed by the harness (Job, images, storage entries)
//! - DTOs: request payloads sent to the platform API

pub mod domain;
pub mod dto;
