//! Reference calculator implementations and the factory that creates them by name.
//!
//! Production backends plug in by implementing [`Calculator`] and registering a
//! constructor with a [`CalculatorFactory`].

pub mod harmonic;

use super::calculator::Calculator;
use super::models::structure::AtomCollection;
use std::collections::BTreeMap;

pub type CalculatorConstructor = fn(AtomCollection) -> Box<dyn Calculator>;

/// Maps method-family names to calculator constructors.
#[derive(Debug, Clone)]
pub struct CalculatorFactory {
    constructors: BTreeMap<String, CalculatorConstructor>,
}

impl Default for CalculatorFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(harmonic::METHOD_FAMILY, create_harmonic);
        factory
    }
}

impl CalculatorFactory {
    /// Creates a factory without any registered backends.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, method_family: &str, constructor: CalculatorConstructor) {
        self.constructors
            .insert(method_family.to_ascii_lowercase(), constructor);
    }

    pub fn create(
        &self,
        method_family: &str,
        structure: AtomCollection,
    ) -> Option<Box<dyn Calculator>> {
        self.constructors
            .get(&method_family.to_ascii_lowercase())
            .map(|constructor| constructor(structure))
    }

    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

fn create_harmonic(structure: AtomCollection) -> Box<dyn Calculator> {
    Box::new(harmonic::HarmonicCalculator::new(structure))
}
