use crate::core::calculator::{CalculationError, Calculator};
use crate::core::calculators::harmonic::HarmonicCalculator;
use crate::core::models::atom::Atom;
use crate::core::models::results::Results;
use crate::core::models::structure::AtomCollection;
use crate::core::settings::ValueCollection;
use crate::engine::registry::SystemsMap;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn water() -> AtomCollection {
    AtomCollection::from_atoms(vec![
        Atom::new("O", Point3::new(0.0, 0.0, 0.0)),
        Atom::new("H", Point3::new(1.4, 0.0, 0.0)),
        Atom::new("H", Point3::new(-0.3, 1.2, 0.0)),
    ])
}

pub fn harmonic_registry(name: &str) -> SystemsMap {
    let mut systems = SystemsMap::new();
    systems.commit(name, Box::new(HarmonicCalculator::new(water())));
    systems
}

#[derive(Debug, Clone, Copy)]
enum Script {
    Succeed,
    Fail,
    NanGradients,
}

/// A calculator that always behaves the same way (fixed results, an error or
/// NaN gradients), counting how often it was asked to compute.
#[derive(Debug, Clone)]
pub struct ScriptedCalculator {
    structure: AtomCollection,
    settings: ValueCollection,
    script: Script,
    computations: Arc<AtomicUsize>,
}

impl ScriptedCalculator {
    pub fn succeeding() -> Self {
        Self::new(Script::Succeed)
    }

    pub fn failing() -> Self {
        Self::new(Script::Fail)
    }

    pub fn nan_gradients() -> Self {
        Self::new(Script::NanGradients)
    }

    fn new(script: Script) -> Self {
        Self {
            structure: water(),
            settings: ValueCollection::new(),
            script,
            computations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `compute` calls across this calculator and its clones.
    pub fn computations(&self) -> Arc<AtomicUsize> {
        self.computations.clone()
    }
}

impl Calculator for ScriptedCalculator {
    fn method_family(&self) -> &str {
        "scripted"
    }

    fn clone_box(&self) -> Box<dyn Calculator> {
        Box::new(self.clone())
    }

    fn configure(&mut self, settings: &ValueCollection) -> Result<(), CalculationError> {
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
        self.computations.fetch_add(1, Ordering::SeqCst);
        let gradient = match self.script {
            Script::Fail => return Err(CalculationError::Failed("scripted failure".to_string())),
            Script::Succeed => Vector3::zeros(),
            Script::NanGradients => Vector3::new(f64::NAN, 0.0, 0.0),
        };
        Ok(Results::new("scripted")
            .with_energy(-76.0)
            .with_gradients(vec![gradient; structure.len()]))
    }
}
