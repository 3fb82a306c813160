use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_GRADIENT_THRESHOLD: f64 = 1e-4;
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

/// Parameters of the steepest-descent geometry optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub max_iterations: usize,
    /// Convergence is reached when the largest gradient component drops below this value.
    pub gradient_threshold: f64,
    pub step_size: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gradient_threshold: DEFAULT_GRADIENT_THRESHOLD,
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

#[derive(Default)]
pub struct OptimizerConfigBuilder {
    max_iterations: Option<usize>,
    gradient_threshold: Option<f64>,
    step_size: Option<f64>,
}

impl OptimizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn gradient_threshold(mut self, threshold: f64) -> Self {
        self.gradient_threshold = Some(threshold);
        self
    }
    pub fn step_size(mut self, step_size: f64) -> Self {
        self.step_size = Some(step_size);
        self
    }

    /// Builds the config, falling back to the defaults for unset parameters.
    pub fn build(self) -> Result<OptimizerConfig, ConfigError> {
        let config = OptimizerConfig {
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            gradient_threshold: self.gradient_threshold.unwrap_or(DEFAULT_GRADIENT_THRESHOLD),
            step_size: self.step_size.unwrap_or(DEFAULT_STEP_SIZE),
        };

        if config.max_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if config.gradient_threshold.is_nan() || config.gradient_threshold <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "gradient_threshold",
                reason: format!("must be positive (got {})", config.gradient_threshold),
            });
        }
        if config.step_size.is_nan() || config.step_size <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "step_size",
                reason: format!("must be positive (got {})", config.step_size),
            });
        }
        Ok(config)
    }
}
