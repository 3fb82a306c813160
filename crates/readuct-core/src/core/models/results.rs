use nalgebra::Vector3;

/// The properties produced by one calculator invocation.
///
/// Properties a backend did not compute stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Results {
    /// Free-text label of the calculation that produced these results.
    pub description: String,
    /// Total energy in the backend's energy unit.
    pub energy: Option<f64>,
    /// Nuclear gradients, one vector per atom, in the structure's atom order.
    pub gradients: Option<Vec<Vector3<f64>>>,
}

impl Results {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn with_gradients(mut self, gradients: Vec<Vector3<f64>>) -> Self {
        self.gradients = Some(gradients);
        self
    }

    /// Largest absolute Cartesian gradient component, if gradients are present.
    ///
    /// A NaN component makes the result NaN.
    pub fn max_gradient_component(&self) -> Option<f64> {
        self.gradients.as_ref().map(|gradients| {
            gradients
                .iter()
                .flat_map(|g| g.iter().copied())
                .fold(0.0_f64, |max, c| {
                    if max.is_nan() || c.is_nan() {
                        f64::NAN
                    } else {
                        max.max(c.abs())
                    }
                })
        })
    }

    /// Whether the energy and every gradient component that is present is finite.
    pub fn is_finite(&self) -> bool {
        self.energy.is_none_or(f64::is_finite)
            && self
                .gradients
                .as_ref()
                .is_none_or(|gradients| gradients.iter().all(|g| g.iter().all(|c| c.is_finite())))
    }

    /// Root-mean-square of all gradient components, if gradients are present.
    pub fn rms_gradient(&self) -> Option<f64> {
        self.gradients.as_ref().map(|gradients| {
            if gradients.is_empty() {
                return 0.0;
            }
            let sum_sq: f64 = gradients.iter().map(|g| g.norm_squared()).sum();
            (sum_sq / (3 * gradients.len()) as f64).sqrt()
        })
    }
}
