//! The task contract and the concrete pipeline steps.
//!
//! A task declares which systems it reads (`input`) and which it produces
//! (`output`) and mutates the [`SystemsMap`] it is handed in [`Task::run`].
//! Shared behavior (input validation, settings extraction, stop-on-error
//! handling) lives in [`TaskBase`], which every concrete task embeds.

pub mod geometry_optimization;
pub mod single_point;

#[cfg(test)]
pub(crate) mod test_support;

use super::config::OptimizerConfig;
use super::error::TaskError;
use super::observer::ObserverSet;
use super::registry::SystemsMap;
use super::settings::{self, UnrecognizedSettingsPolicy};
use crate::core::calculator::CalculationError;
use crate::core::log::Log;
use crate::core::settings::{SettingsError, ValueCollection};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use geometry_optimization::GeometryOptimizationTask;
pub use single_point::SinglePointTask;

/// One step of a pipeline.
pub trait Task {
    /// Human-readable identifier used in diagnostics.
    fn name(&self) -> &str;

    fn base(&self) -> &TaskBase;

    /// The systems this task expects to find in the registry.
    fn input(&self) -> &[String] {
        self.base().input()
    }

    /// The systems this task creates or overwrites on success.
    fn output(&self) -> &[String] {
        self.base().output()
    }

    /// Executes the task.
    ///
    /// With `test_mode` set, only the inputs and settings are validated: no
    /// computation is performed and `systems` is left untouched.
    ///
    /// # Return
    ///
    /// `Ok(true)` on success, `Ok(false)` if the underlying computation failed
    /// and the settings asked not to stop on errors.
    ///
    /// # Errors
    ///
    /// Missing input systems, unrecognized or ill-typed task settings, and
    /// computational failures while `stop_on_error` is in effect.
    fn run(
        &self,
        systems: &mut SystemsMap,
        settings: ValueCollection,
        test_mode: bool,
        observers: &ObserverSet,
    ) -> Result<bool, TaskError>;
}

/// State and helpers shared by every task.
#[derive(Debug, Clone)]
pub struct TaskBase {
    input: Vec<String>,
    output: Vec<String>,
    logger: Log,
    unrecognized_settings: UnrecognizedSettingsPolicy,
}

impl TaskBase {
    /// Creates the shared task state.
    ///
    /// Without an explicit `logger` the task gets its own [`Log::default`],
    /// which forwards to `tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NoInputSystems`] if `input` is empty.
    pub fn new(
        task: &str,
        input: Vec<String>,
        output: Vec<String>,
        logger: Option<Log>,
    ) -> Result<Self, TaskError> {
        if input.is_empty() {
            return Err(TaskError::NoInputSystems {
                task: task.to_string(),
            });
        }
        Ok(Self {
            input,
            output,
            logger: logger.unwrap_or_default(),
            unrecognized_settings: UnrecognizedSettingsPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: UnrecognizedSettingsPolicy) -> Self {
        self.unrecognized_settings = policy;
        self
    }

    pub fn input(&self) -> &[String] {
        &self.input
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn logger(&self) -> &Log {
        &self.logger
    }

    pub fn unrecognized_settings_policy(&self) -> UnrecognizedSettingsPolicy {
        self.unrecognized_settings
    }

    /// The first declared input; single-input tasks act only on this one.
    pub fn primary_input(&self) -> &str {
        &self.input[0]
    }

    /// The first declared output, or the primary input when no output is declared.
    pub fn primary_output(&self) -> &str {
        self.output
            .first()
            .map(String::as_str)
            .unwrap_or_else(|| self.primary_input())
    }

    pub fn warning_if_multiple_inputs_given(&self) {
        if self.input.len() > 1 {
            self.logger.warning.write(
                "  Warning: More than one input system was specified. Only taking first and ignoring all others.",
            );
        }
    }

    pub fn warning_if_multiple_outputs_given(&self) {
        if self.output.len() > 1 {
            self.logger.warning.write(
                "  Warning: More than one output system was specified. Only taking first and ignoring all others.",
            );
        }
    }

    pub fn extract_stop_on_error(&self, settings: &mut ValueCollection) -> Result<bool, SettingsError> {
        settings::extract_stop_on_error(settings, &self.logger)
    }

    pub fn extract_silent_calculator(&self, settings: &mut ValueCollection) -> Result<bool, SettingsError> {
        settings::extract_silent_calculator(settings)
    }

    pub fn check_residual_settings(&self, task: &str, settings: &ValueCollection) -> Result<(), TaskError> {
        settings::check_residual_settings(task, settings, self.unrecognized_settings, &self.logger)
    }

    /// Applies the stop-on-error policy to a failed computation.
    ///
    /// With `stop_on_error` the failure becomes [`TaskError::Calculation`];
    /// otherwise it is reported on the warning stream and `Ok(false)` is returned.
    pub fn handle_calculation_failure(
        &self,
        task: &str,
        stop_on_error: bool,
        error: CalculationError,
    ) -> Result<bool, TaskError> {
        if stop_on_error {
            return Err(TaskError::Calculation {
                task: task.to_string(),
                source: error,
            });
        }
        self.logger.warning.write(format!(
            "  {} failed: {}\n  Continuing because 'stop_on_error' is disabled.",
            task, error
        ));
        Ok(false)
    }
}

/// Options shared by all task kinds when building tasks by name.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    pub logger: Option<Log>,
    pub unrecognized_settings: UnrecognizedSettingsPolicy,
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    SinglePoint,
    GeometryOptimization,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown task type '{0}'")]
pub struct ParseTaskKindError(pub String);

impl FromStr for TaskKind {
    type Err = ParseTaskKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sp" | "single_point" | "singlepoint" => Ok(TaskKind::SinglePoint),
            "opt" | "geo_opt" | "geoopt" | "geometry_optimization" => {
                Ok(TaskKind::GeometryOptimization)
            }
            _ => Err(ParseTaskKindError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::SinglePoint => write!(f, "single_point"),
            TaskKind::GeometryOptimization => write!(f, "geometry_optimization"),
        }
    }
}

impl TaskKind {
    pub fn build(
        self,
        input: Vec<String>,
        output: Vec<String>,
        options: TaskOptions,
    ) -> Result<Box<dyn Task>, TaskError> {
        let task: Box<dyn Task> = match self {
            TaskKind::SinglePoint => Box::new(
                SinglePointTask::new(input, output, options.logger)?
                    .with_policy(options.unrecognized_settings),
            ),
            TaskKind::GeometryOptimization => Box::new(
                GeometryOptimizationTask::new(input, output, options.logger)?
                    .with_policy(options.unrecognized_settings)
                    .with_optimizer(options.optimizer),
            ),
        };
        Ok(task)
    }
}
