use super::atom::Atom;
use nalgebra::{Point3, Vector3};

/// An ordered collection of atoms forming one molecular structure.
///
/// This is the structural snapshot calculators compute on and observers receive.
/// Atom order is significant: gradients in [`Results`](super::results::Results)
/// are indexed in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomCollection {
    atoms: Vec<Atom>,
}

impl AtomCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_atoms(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn push(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.atoms.iter().map(|atom| &atom.position)
    }

    /// Moves every atom by the matching displacement vector.
    ///
    /// Extra displacements are ignored; atoms without a displacement stay in place.
    pub fn displace(&mut self, displacements: &[Vector3<f64>]) {
        for (atom, delta) in self.atoms.iter_mut().zip(displacements) {
            atom.position += delta;
        }
    }

    /// Returns the element symbols joined into a compact formula-like label, e.g. "OHH".
    pub fn composition(&self) -> String {
        self.atoms.iter().map(|atom| atom.element.as_str()).collect()
    }
}
