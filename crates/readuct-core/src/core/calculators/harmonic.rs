use crate::core::calculator::{CalculationError, Calculator};
use crate::core::models::results::Results;
use crate::core::models::structure::AtomCollection;
use crate::core::settings::ValueCollection;
use nalgebra::Vector3;

pub const METHOD_FAMILY: &str = "harmonic";

pub const FORCE_CONSTANT: &str = "force_constant";
pub const EQUILIBRIUM_DISTANCE: &str = "equilibrium_distance";

const DEFAULT_FORCE_CONSTANT: f64 = 1.0;
const DEFAULT_EQUILIBRIUM_DISTANCE: f64 = 1.0;
const OVERLAP_TOLERANCE: f64 = 1e-8;

/// A pairwise harmonic spring model.
///
/// Every pair of atoms `(i, j)` contributes `0.5 * k * (r_ij - r0)^2` to the
/// energy. The model has no chemistry in it; it exists so that pipelines can be
/// exercised end to end without an external engine.
#[derive(Debug, Clone)]
pub struct HarmonicCalculator {
    structure: AtomCollection,
    settings: ValueCollection,
}

impl HarmonicCalculator {
    pub fn new(structure: AtomCollection) -> Self {
        let mut settings = ValueCollection::new();
        settings.add_or_override(FORCE_CONSTANT, DEFAULT_FORCE_CONSTANT);
        settings.add_or_override(EQUILIBRIUM_DISTANCE, DEFAULT_EQUILIBRIUM_DISTANCE);
        Self {
            structure,
            settings,
        }
    }

    fn parameter(&self, key: &str, default: f64) -> Result<f64, CalculationError> {
        Ok(self.settings.get_as(key)?.unwrap_or(default))
    }
}

impl Calculator for HarmonicCalculator {
    fn method_family(&self) -> &str {
        METHOD_FAMILY
    }

    fn clone_box(&self) -> Box<dyn Calculator> {
        Box::new(self.clone())
    }

    fn configure(&mut self, settings: &ValueCollection) -> Result<(), CalculationError> {
        for (key, _) in settings.iter() {
            if key != FORCE_CONSTANT && key != EQUILIBRIUM_DISTANCE {
                return Err(CalculationError::InvalidSettings(format!(
                    "unknown setting '{}' for the {} calculator",
                    key, METHOD_FAMILY
                )));
            }
            let value: Option<f64> = settings.get_as(key)?;
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(CalculationError::InvalidSettings(format!(
                        "'{}' must be a finite, non-negative number (got {})",
                        key, value
                    )));
                }
            }
        }
        self.settings.merge(settings);
        Ok(())
    }

    fn settings(&self) -> &ValueCollection {
        &self.settings
    }

    fn structure(&self) -> &AtomCollection {
        &self.structure
    }

    fn set_structure(&mut self, structure: AtomCollection) {
        self.structure = structure;
    }

    fn compute(&mut self, structure: &AtomCollection) -> Result<Results, CalculationError> {
        if structure.is_empty() {
            return Err(CalculationError::InvalidStructure(
                "structure contains no atoms".to_string(),
            ));
        }

        if let Some(index) = structure
            .positions()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(CalculationError::InvalidStructure(format!(
                "atom {} has a non-finite position",
                index
            )));
        }

        let k = self.parameter(FORCE_CONSTANT, DEFAULT_FORCE_CONSTANT)?;
        let r0 = self.parameter(EQUILIBRIUM_DISTANCE, DEFAULT_EQUILIBRIUM_DISTANCE)?;

        let atoms = structure.atoms();
        let mut energy = 0.0;
        let mut gradients = vec![Vector3::zeros(); atoms.len()];

        for i in 0..atoms.len() {
            for j in (i + 1)..atoms.len() {
                let delta = atoms[i].position - atoms[j].position;
                let r = delta.norm();
                if r < OVERLAP_TOLERANCE {
                    return Err(CalculationError::InvalidStructure(format!(
                        "atoms {} and {} overlap",
                        i, j
                    )));
                }
                let stretch = r - r0;
                energy += 0.5 * k * stretch * stretch;
                let pair_gradient = delta * (k * stretch / r);
                gradients[i] += pair_gradient;
                gradients[j] -= pair_gradient;
            }
        }

        Ok(Results::new(format!("{} energy", METHOD_FAMILY))
            .with_energy(energy)
            .with_gradients(gradients))
    }
}
