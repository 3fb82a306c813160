use nalgebra::Point3;

/// Represents a single atom of a molecular structure.
///
/// Atoms carry only what every calculator needs: the chemical element symbol
/// and a Cartesian position. Any backend-specific parameterization lives inside
/// the calculator itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The element symbol (e.g., "O", "H", "Fe").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new atom from an element symbol and a position.
    ///
    /// The element symbol is trimmed and normalized to its conventional
    /// capitalization ("FE" and "fe" both become "Fe").
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: normalize_element(element),
            position,
        }
    }
}

fn normalize_element(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
