use super::models::results::Results;
use super::models::structure::AtomCollection;
use super::settings::{SettingsError, ValueCollection};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("Calculation did not converge after {iterations} iterations")]
    Convergence { iterations: usize },

    #[error("Invalid calculator settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Calculation failed: {0}")]
    Failed(String),
}

/// A configured computational backend bound to one molecular structure.
///
/// Calculators are exclusively owned: the registry holds one per system name
/// and tasks work on private copies obtained through [`clone_box`](Self::clone_box).
/// Implementations must make clones fully independent, so that configuring or
/// moving a clone never shows through to the original.
pub trait Calculator: fmt::Debug + Send {
    /// Identifier of the backend family (e.g. "harmonic").
    fn method_family(&self) -> &str;

    /// Produces a deep, independently owned copy of this calculator.
    fn clone_box(&self) -> Box<dyn Calculator>;

    /// Merges `settings` into the calculator's current settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is unknown to the backend or a value has the
    /// wrong type. The calculator is left unchanged in that case.
    fn configure(&mut self, settings: &ValueCollection) -> Result<(), CalculationError>;

    fn settings(&self) -> &ValueCollection;

    fn structure(&self) -> &AtomCollection;

    fn set_structure(&mut self, structure: AtomCollection);

    /// Computes energy and gradients for `structure`.
    fn compute(&mut self, structure: &AtomCollection) -> Result<Results, CalculationError>;

    /// Computes results for the calculator's own bound structure.
    fn calculate(&mut self) -> Result<Results, CalculationError> {
        let structure = self.structure().clone();
        self.compute(&structure)
    }
}

/// Turns results with a non-finite energy or gradient into a failure.
pub fn ensure_finite(results: Results) -> Result<Results, CalculationError> {
    if results.is_finite() {
        Ok(results)
    } else {
        Err(CalculationError::Failed(format!(
            "{} produced a non-finite energy or gradient",
            results.description
        )))
    }
}

impl Clone for Box<dyn Calculator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
