//! # ReaDuct Core Library
//!
//! A task-orchestration library for chemistry computation pipelines. Named systems, each
//! bound to a pluggable calculator backend, are consumed, transformed and produced by
//! discrete computational tasks that share settings handling, error policy and progress
//! observation.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`AtomCollection`, `Results`), the
//!   generic settings container (`ValueCollection`), the `Calculator` capability with its
//!   reference implementations, the diagnostic `Log` and structure file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful orchestration layer. It owns the
//!   named-system registry (`SystemsMap`), the task-settings extraction protocol, the
//!   observer and progress plumbing and the `Task` contract with its concrete tasks.
//!
//! - **[`workflows`]: The Public API.** Sequences tasks into a pipeline run over one
//!   registry, validating the whole pipeline before any computation is spent.

pub mod core;
pub mod engine;
pub mod workflows;
