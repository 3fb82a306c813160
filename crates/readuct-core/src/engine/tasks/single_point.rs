use super::{Task, TaskBase};
use crate::core::calculator::ensure_finite;
use crate::core::log::Log;
use crate::core::models::results::Results;
use crate::core::settings::ValueCollection;
use crate::engine::error::TaskError;
use crate::engine::observer::ObserverSet;
use crate::engine::registry::SystemsMap;
use crate::engine::settings::UnrecognizedSettingsPolicy;
use tracing::{info, instrument};

pub const LABEL: &str = "single_point";

/// Computes energy and gradients for the first input system once.
///
/// The calculation runs on a private copy of the input calculator, which is
/// committed under the first output name (or back under the input name when
/// no output is declared) only if the calculation succeeds.
#[derive(Debug, Clone)]
pub struct SinglePointTask {
    base: TaskBase,
}

impl SinglePointTask {
    pub const NAME: &'static str = "Single Point Calculation";

    pub fn new(
        input: Vec<String>,
        output: Vec<String>,
        logger: Option<Log>,
    ) -> Result<Self, TaskError> {
        Ok(Self {
            base: TaskBase::new(Self::NAME, input, output, logger)?,
        })
    }

    pub fn with_policy(mut self, policy: UnrecognizedSettingsPolicy) -> Self {
        self.base = self.base.with_policy(policy);
        self
    }

    fn print_results(&self, system: &str, results: &Results, silent_calculator: bool) {
        let output = &self.base.logger().output;
        if let Some(energy) = results.energy {
            output.write(format!("  The ({}) single point energy is {:.10}", system, energy));
        }
        if silent_calculator {
            return;
        }
        if let Some(gradients) = &results.gradients {
            output.write(format!("  Gradients ({}):", results.description));
            for (index, gradient) in gradients.iter().enumerate() {
                output.write(format!(
                    "  {:>5} {:>16.10} {:>16.10} {:>16.10}",
                    index, gradient.x, gradient.y, gradient.z
                ));
            }
        }
    }
}

impl Task for SinglePointTask {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn base(&self) -> &TaskBase {
        &self.base
    }

    #[instrument(skip_all, name = "single_point_task")]
    fn run(
        &self,
        systems: &mut SystemsMap,
        mut settings: ValueCollection,
        test_mode: bool,
        _observers: &ObserverSet,
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
        let results = match calculator.calculate().and_then(ensure_finite) {
            Ok(results) => results,
            Err(error) => {
                return self
                    .base
                    .handle_calculation_failure(self.name(), stop_on_error, error);
            }
        };

        self.print_results(input_name, &results, silent_calculator);
        info!(input = input_name, output = output_name, "Single point calculation complete.");
        systems.commit(output_name, calculator);
        Ok(true)
    }
}
