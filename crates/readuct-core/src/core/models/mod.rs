//! Data structures describing the molecular state a calculator is bound to and the
//! results it produces.

pub mod atom;
pub mod results;
pub mod structure;
