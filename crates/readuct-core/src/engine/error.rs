use super::settings::unrecognized_settings_message;
use crate::core::calculator::CalculationError;
use crate::core::settings::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("No input systems specified for {task}!")]
    NoInputSystems { task: String },

    #[error("System name '{name}' is missing in {task}")]
    MissingSystem { name: String, task: String },

    #[error(
        "Unrecognized task settings {keys:?} for {task}.\n{hint}",
        hint = unrecognized_settings_message(.task)
    )]
    UnrecognizedSettings { task: String, keys: Vec<String> },

    #[error("{task} failed: {source}")]
    Calculation {
        task: String,
        #[source]
        source: CalculationError,
    },

    #[error("Invalid task settings: {0}")]
    Settings(#[from] SettingsError),
}

impl TaskError {
    /// Whether the error stems from the pipeline definition rather than from a
    /// computation. Such errors should be caught by a test-mode validation pass.
    pub fn is_validation_error(&self) -> bool {
        !matches!(self, TaskError::Calculation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_calculation_failures_are_not_validation_errors() {
        let missing = TaskError::MissingSystem {
            name: "water".to_string(),
            task: "Single Point Calculation".to_string(),
        };
        let unrecognized = TaskError::UnrecognizedSettings {
            task: "Single Point Calculation".to_string(),
            keys: vec!["foo".to_string()],
        };
        let calculation = TaskError::Calculation {
            task: "Geometry Optimization".to_string(),
            source: CalculationError::Convergence { iterations: 10 },
        };

        assert!(missing.is_validation_error());
        assert!(unrecognized.is_validation_error());
        assert!(!calculation.is_validation_error());
    }

    #[test]
    fn unrecognized_settings_message_names_the_task_and_keys() {
        let error = TaskError::UnrecognizedSettings {
            task: "Geometry Optimization".to_string(),
            keys: vec!["foo".to_string()],
        };
        let message = error.to_string();
        assert!(message.contains("\"foo\""));
        assert!(message.contains("Geometry Optimization"));
        assert!(message.contains("stop_on_error"));
    }
}
