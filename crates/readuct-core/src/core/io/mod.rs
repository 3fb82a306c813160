//! Input/output for structure file formats.
//!
//! Formats implement the [`traits::StructureFile`] trait; the XYZ format is the
//! exchange format used for loading systems and recording trajectories.

pub mod traits;
pub mod xyz;
