use crate::error::{CliError, Result};
use readuct::core::calculators::CalculatorFactory;
use readuct::core::io::traits::StructureFile;
use readuct::core::io::xyz::XyzFile;
use readuct::core::settings::ValueCollection;
use readuct::engine::config::OptimizerConfigBuilder;
use readuct::engine::registry::SystemsMap;
use readuct::engine::settings::UnrecognizedSettingsPolicy;
use readuct::engine::tasks::{TaskKind, TaskOptions};
use readuct::workflows::pipeline::Pipeline;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

fn default_method_family() -> String {
    readuct::core::calculators::harmonic::METHOD_FAMILY.to_string()
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SystemEntry {
    /// XYZ file, relative to the pipeline file.
    pub path: PathBuf,
    #[serde(default = "default_method_family")]
    pub method_family: String,
    /// Calculator settings, handed to the calculator as-is.
    #[serde(default)]
    pub settings: toml::Table,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct OptimizerEntry {
    pub max_iterations: Option<usize>,
    pub gradient_threshold: Option<f64>,
    pub step_size: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyEntry {
    Reject,
    Warn,
}

impl From<PolicyEntry> for UnrecognizedSettingsPolicy {
    fn from(p: PolicyEntry) -> Self {
        match p {
            PolicyEntry::Reject => UnrecognizedSettingsPolicy::Reject,
            PolicyEntry::Warn => UnrecognizedSettingsPolicy::Warn,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TaskEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub input: Vec<String>,
    #[serde(default)]
    pub output: Vec<String>,
    /// Task settings; deliberately free-form, the task itself rejects unknown keys.
    #[serde(default)]
    pub settings: toml::Table,
    pub optimizer: Option<OptimizerEntry>,
    pub unrecognized_settings: Option<PolicyEntry>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    #[serde(default)]
    pub systems: BTreeMap<String, SystemEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

/// The registry and pipeline assembled from a pipeline file.
pub struct LoadedPipeline {
    pub systems: SystemsMap,
    pub pipeline: Pipeline,
}

impl PipelineFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading pipeline from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads every system and builds every task.
    ///
    /// System paths are resolved relative to `base_dir`. `default_policy`
    /// applies to tasks that do not set `unrecognized-settings` themselves.
    pub fn assemble(
        self,
        base_dir: &Path,
        factory: &CalculatorFactory,
        default_policy: UnrecognizedSettingsPolicy,
    ) -> Result<LoadedPipeline> {
        if self.tasks.is_empty() {
            return Err(CliError::Config(
                "The pipeline file does not define any tasks.".to_string(),
            ));
        }

        let mut systems = SystemsMap::new();
        for (name, entry) in self.systems {
            let path = base_dir.join(&entry.path);
            debug!(system = %name, path = ?path, "Loading system.");
            let (structure, _) =
                XyzFile::read_from_path(&path).map_err(|e| CliError::FileParsing {
                    path: path.clone(),
                    source: e.into(),
                })?;

            let mut calculator = factory
                .create(&entry.method_family, structure)
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Unknown method family '{}' for system '{}' (available: {}).",
                        entry.method_family,
                        name,
                        factory.available().collect::<Vec<_>>().join(", ")
                    ))
                })?;
            calculator
                .configure(&ValueCollection::from(entry.settings))
                .map_err(|e| {
                    CliError::Config(format!("Invalid settings for system '{}': {}", name, e))
                })?;
            systems.commit(name, calculator);
        }

        let mut pipeline = Pipeline::new();
        for (index, entry) in self.tasks.into_iter().enumerate() {
            let kind: TaskKind = entry
                .kind
                .parse()
                .map_err(|e| CliError::Config(format!("Task #{}: {}", index + 1, e)))?;

            let optimizer = entry.optimizer.unwrap_or_default();
            let mut builder = OptimizerConfigBuilder::new();
            if let Some(v) = optimizer.max_iterations {
                builder = builder.max_iterations(v);
            }
            if let Some(v) = optimizer.gradient_threshold {
                builder = builder.gradient_threshold(v);
            }
            if let Some(v) = optimizer.step_size {
                builder = builder.step_size(v);
            }
            let optimizer = builder
                .build()
                .map_err(|e| CliError::Config(format!("Task #{}: {}", index + 1, e)))?;

            let options = TaskOptions {
                logger: None,
                unrecognized_settings: entry
                    .unrecognized_settings
                    .map(Into::into)
                    .unwrap_or(default_policy),
                optimizer,
            };
            let task = kind.build(entry.input, entry.output, options)?;
            pipeline.push(task, ValueCollection::from(entry.settings));
        }

        Ok(LoadedPipeline { systems, pipeline })
    }
}
