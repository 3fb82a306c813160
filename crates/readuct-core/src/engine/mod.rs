//! # Engine Module
//!
//! The stateful orchestration layer of ReaDuct. It mediates every interaction
//! between tasks and the calculators they operate on.
//!
//! ## Architecture
//!
//! - **Named-System Registry** ([`registry`]) - Owned calculators keyed by system name,
//!   with clone-on-borrow and commit semantics
//! - **Settings Extraction** ([`settings`]) - The uniform protocol every task uses to pull
//!   its options out of a task-settings collection
//! - **Observation** ([`observer`], [`progress`]) - Per-step observer callbacks and
//!   pipeline-level progress events
//! - **Configuration** ([`config`]) - Typed algorithm parameters for concrete tasks
//! - **Tasks** ([`tasks`]) - The `Task` contract and the concrete pipeline steps
//! - **Error Handling** ([`error`]) - The failure taxonomy surfaced by tasks

pub mod config;
pub mod error;
pub mod observer;
pub mod progress;
pub mod registry;
pub mod settings;
pub mod tasks;
