//! # Core Module
//!
//! Fundamental building blocks shared by every task of a ReaDuct pipeline.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, structures and calculation results
//! - **Settings** ([`settings`]) - The generic, consuming key-value settings container
//! - **Calculators** ([`calculator`], [`calculators`]) - The backend capability and the
//!   reference implementations shipped with the library
//! - **Diagnostics** ([`log`]) - The stream-based diagnostic sink handed to tasks
//! - **File I/O** ([`io`]) - Reading and writing structure files

pub mod calculator;
pub mod calculators;
pub mod io;
pub mod log;
pub mod models;
pub mod settings;
