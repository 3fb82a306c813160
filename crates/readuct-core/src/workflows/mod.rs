//! # Workflows Module
//!
//! High-level entry points that sequence tasks over a registry of named systems.
//!
//! - **Pipeline** ([`pipeline`]) - Validates a whole task sequence in test mode, then
//!   executes it strictly in order, applying each task's stop-on-error policy.

pub mod pipeline;
