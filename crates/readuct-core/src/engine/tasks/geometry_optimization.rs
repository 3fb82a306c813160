use super::{Task, TaskBase};
use crate::core::calculator::{CalculationError, Calculator, ensure_finite};
use crate::core::log::Log;
use crate::core::models::results::Results;
use crate::core::settings::ValueCollection;
use crate::engine::config::OptimizerConfig;
use crate::engine::error::TaskError;
use crate::engine::observer::ObserverSet;
use crate::engine::registry::SystemsMap;
use crate::engine::settings::UnrecognizedSettingsPolicy;
use nalgebra::Vector3;
use tracing::{debug, info, instrument};

pub const LABEL: &str = "geometry_optimization";

/// Relaxes the structure of the first input system by steepest descent.
///
/// Each cycle computes energy and gradients, notifies the observers and moves
/// every atom by `-step_size * gradient`. The optimized calculator is committed
/// under the first output name (or the input name) only on convergence; an
/// unconverged optimization leaves the registry as it was.
#[derive(Debug, Clone)]
pub struct GeometryOptimizationTask {
    base: TaskBase,
    optimizer: OptimizerConfig,
}

struct Converged {
    cycles: usize,
    results: Results,
}

impl GeometryOptimizationTask {
    pub const NAME: &'static str = "Geometry Optimization";

    pub fn new(
        input: Vec<String>,
        output: Vec<String>,
        logger: Option<Log>,
    ) -> Result<Self, TaskError> {
        Ok(Self {
            base: TaskBase::new(Self::NAME, input, output, logger)?,
            optimizer: OptimizerConfig::default(),
        })
    }

    pub fn with_policy(mut self, policy: UnrecognizedSettingsPolicy) -> Self {
        self.base = self.base.with_policy(policy);
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn optimizer(&self) -> &OptimizerConfig {
        &self.optimizer
    }

    fn optimize(
        &self,
        calculator: &mut dyn Calculator,
        observers: &ObserverSet,
    ) -> Result<Converged, CalculationError> {
        let mut structure = calculator.structure().clone();

        for cycle in 1..=self.optimizer.max_iterations {
            let results = ensure_finite(calculator.compute(&structure)?)?;
            observers.notify(cycle, &structure, &results, LABEL);

            let gradients = results.gradients.as_ref().ok_or_else(|| {
                CalculationError::Failed(format!(
                    "the {} calculator did not provide gradients",
                    calculator.method_family()
                ))
            })?;
            let max_gradient = results.max_gradient_component().unwrap_or(0.0);
            debug!(cycle, energy = ?results.energy, max_gradient, "Optimization cycle.");

            if max_gradient < self.optimizer.gradient_threshold {
                calculator.set_structure(structure);
                return Ok(Converged {
                    cycles: cycle,
                    results,
                });
            }

            let step: Vec<Vector3<f64>> = gradients
                .iter()
                .map(|g| g * -self.optimizer.step_size)
                .collect();
            structure.displace(&step);
        }

        Err(CalculationError::Convergence {
            iterations: self.optimizer.max_iterations,
        })
    }
}

impl Task for GeometryOptimizationTask {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &TaskBase {
        &self.base
    }

    #[instrument(skip_all, name = "geometry_optimization_task")]
    fn run(
        &self,
        systems: &mut SystemsMap,
        mut settings: ValueCollection,
        test_mode: bool,
        observers: &ObserverSet,
    ) -> Result<bool, TaskError> {
        self.base.warning_if_multiple_inputs_given();
        self.base.warning_if_multiple_outputs_given();

        let input_name = self.base.primary_input();
        let output_name = self.base.primary_output();
        systems.validate_inputs(self.input(), self.name())?;

        let stop_on_error = self.base.extract_stop_on_error(&mut settings)?;
        let silent_calculator = self.base.extract_silent_calculator(&mut settings)?;
        self.base.check_residual_settings(self.name(), &settings)?;

        if test_mode {
            return Ok(true);
        }

        let mut calculator = systems.clone_for_task(input_name, self.name())?;
        let converged = match self.optimize(calculator.as_mut(), observers) {
            Ok(converged) => converged,
            Err(error) => {
                return self
                    .base
                    .handle_calculation_failure(self.name(), stop_on_error, error);
            }
        };

        let output = &self.base.logger().output;
        output.write(format!(
            "  Structure optimization converged after {} cycles.",
            converged.cycles
        ));
        if let Some(energy) = converged.results.energy {
            output.write(format!("  The ({}) final energy is {:.10}", output_name, energy));
        }
        if !silent_calculator {
            output.write(format!(
                "  Final RMS gradient: {:.3e}",
                converged.results.rms_gradient().unwrap_or(0.0)
            ));
        }

        info!(
            input = input_name,
            output = output_name,
            cycles = converged.cycles,
            "Geometry optimization complete."
        );
        systems.commit(output_name, calculator);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculators::harmonic::HarmonicCalculator;
    use crate::core::models::structure::AtomCollection;
    use crate::engine::config::OptimizerConfigBuilder;
    use crate::engine::tasks::test_support::{ScriptedCalculator, harmonic_registry, names, water};
    use std::cell::RefCell;

    fn task(log: Log) -> GeometryOptimizationTask {
        GeometryOptimizationTask::new(names(&["water"]), names(&["water_opt"]), Some(log))
            .unwrap()
            .with_optimizer(
                OptimizerConfigBuilder::new()
                    .max_iterations(2000)
                    .gradient_threshold(1e-6)
                    .step_size(0.2)
                    .build()
                    .unwrap(),
            )
    }

    #[test]
    fn optimization_commits_relaxed_structure_under_output_name() {
        let mut systems = harmonic_registry("water");

        let success = task(Log::silent())
            .run(&mut systems, ValueCollection::new(), false, &ObserverSet::new())
            .unwrap();

        assert!(success);
        assert_eq!(systems.lookup("water", "test").unwrap().structure(), &water());

        let optimized = systems.lookup_mut("water_opt", "test").unwrap();
        assert_ne!(optimized.structure(), &water());
        let results = optimized.calculate().unwrap();
        assert!(results.max_gradient_component().unwrap() < 1e-6);
        assert!(results.energy.unwrap() < 1e-10);
    }

    #[test]
    fn observers_see_every_cycle_in_order() {
        let steps = RefCell::new(Vec::new());
        let observers = ObserverSet::new().with(Box::new(
            |step: usize, _: &AtomCollection, _: &Results, label: &str| {
                assert_eq!(label, LABEL);
                steps.borrow_mut().push(step);
            },
        ));

        let mut systems = harmonic_registry("water");
        task(Log::silent())
            .run(&mut systems, ValueCollection::new(), false, &observers)
            .unwrap();

        drop(observers);
        let steps = steps.into_inner();
        assert!(!steps.is_empty());
        assert_eq!(steps, (1..=steps.len()).collect::<Vec<_>>());
    }

    #[test]
    fn unconverged_optimization_is_recoverable_when_allowed() {
        let (log, capture) = Log::capture();
        let task = task(log).with_optimizer(
            OptimizerConfigBuilder::new()
                .max_iterations(1)
                .build()
                .unwrap(),
        );
        let mut systems = harmonic_registry("water");
        let settings: ValueCollection = [("stop_on_error", false)].into_iter().collect();

        let success = task
            .run(&mut systems, settings, false, &ObserverSet::new())
            .unwrap();

        assert!(!success);
        assert!(!systems.contains("water_opt"));
        assert!(capture.warnings().iter().any(|w| w.contains("did not converge")));
    }

    #[test]
    fn deprecated_allow_unconverged_behaves_like_stop_on_error_false() {
        let (log, capture) = Log::capture();
        let task = task(log).with_optimizer(
            OptimizerConfigBuilder::new()
                .max_iterations(1)
                .build()
                .unwrap(),
        );
        let mut systems = harmonic_registry("water");
        let settings: ValueCollection = [("allow_unconverged", true)].into_iter().collect();

        let success = task
            .run(&mut systems, settings, false, &ObserverSet::new())
            .unwrap();

        assert!(!success);
        assert!(capture.warnings()[0].contains("deprecated"));
    }

    #[test]
    fn unconverged_optimization_is_fatal_by_default() {
        let task = task(Log::silent()).with_optimizer(
            OptimizerConfigBuilder::new()
                .max_iterations(1)
                .build()
                .unwrap(),
        );
        let mut systems = harmonic_registry("water");
        let result = task.run(&mut systems, ValueCollection::new(), false, &ObserverSet::new());
        assert!(matches!(
            result,
            Err(TaskError::Calculation {
                source: CalculationError::Convergence { iterations: 1 },
                ..
            })
        ));
    }

    #[test]
    fn failing_calculator_in_first_cycle_leaves_registry_unchanged() {
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(ScriptedCalculator::failing()));
        let settings: ValueCollection = [("stop_on_error", false)].into_iter().collect();

        let success = task(Log::silent())
            .run(&mut systems, settings, false, &ObserverSet::new())
            .unwrap();

        assert!(!success);
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["water"]);
    }

    #[test]
    fn missing_secondary_input_fails_before_optimizing() {
        let mut systems = harmonic_registry("water");
        let task = GeometryOptimizationTask::new(
            names(&["water", "ghost"]),
            names(&["water_opt"]),
            Some(Log::silent()),
        )
        .unwrap();

        let result = task.run(&mut systems, ValueCollection::new(), false, &ObserverSet::new());

        assert!(matches!(result, Err(TaskError::MissingSystem { ref name, .. }) if name == "ghost"));
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["water"]);
    }

    #[test]
    fn nan_coordinates_fail_instead_of_converging() {
        let mut structure = water();
        structure.displace(&[Vector3::new(f64::NAN, 0.0, 0.0), Vector3::zeros(), Vector3::zeros()]);
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(HarmonicCalculator::new(structure)));

        let result = task(Log::silent()).run(&mut systems, ValueCollection::new(), false, &ObserverSet::new());

        assert!(matches!(
            result,
            Err(TaskError::Calculation {
                source: CalculationError::InvalidStructure(_),
                ..
            })
        ));
        assert!(!systems.contains("water_opt"));
    }

    #[test]
    fn nan_gradients_are_a_recoverable_failure() {
        let (log, capture) = Log::capture();
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(ScriptedCalculator::nan_gradients()));
        let settings: ValueCollection = [("stop_on_error", false)].into_iter().collect();

        let success = task(log)
            .run(&mut systems, settings, false, &ObserverSet::new())
            .unwrap();

        assert!(!success);
        assert!(!systems.contains("water_opt"));
        assert!(capture.warnings()[0].contains("non-finite"));
    }

    #[test]
    fn test_mode_never_mutates_registry() {
        let mut systems = harmonic_registry("water");
        let observed = RefCell::new(0);
        let observers = ObserverSet::new().with(Box::new(
            |_: usize, _: &AtomCollection, _: &Results, _: &str| *observed.borrow_mut() += 1,
        ));

        let success = task(Log::silent())
            .run(&mut systems, ValueCollection::new(), true, &observers)
            .unwrap();

        assert!(success);
        assert_eq!(*observed.borrow(), 0);
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["water"]);
        assert_eq!(systems.lookup("water", "test").unwrap().structure(), &water());
    }

    #[test]
    fn unrecognized_settings_name_the_task() {
        let mut systems = harmonic_registry("water");
        let settings: ValueCollection = [("foo", 1)].into_iter().collect();
        let error = task(Log::silent())
            .run(&mut systems, settings, false, &ObserverSet::new())
            .unwrap_err();
        assert!(error.to_string().contains(GeometryOptimizationTask::NAME));
        assert!(!systems.contains("water_opt"));
    }
}
