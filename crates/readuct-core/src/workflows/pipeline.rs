use crate::core::settings::ValueCollection;
use crate::engine::error::TaskError;
use crate::engine::observer::ObserverSet;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::registry::SystemsMap;
use crate::engine::tasks::Task;
use tracing::{debug, error, info, instrument, warn};

/// The lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    ValidatingInputs,
    Executing,
    Succeeded,
    /// Every task ran, but at least one reported a non-fatal failure.
    FailedRecoverable,
    FailedFatal,
}

/// A task together with the settings for its invocation.
pub struct PipelineStep {
    pub task: Box<dyn Task>,
    pub settings: ValueCollection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub state: RunState,
    pub outcomes: Vec<TaskOutcome>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Succeeded
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success)
    }
}

/// An ordered sequence of tasks run against one [`SystemsMap`].
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Box<dyn Task>, settings: ValueCollection) {
        self.steps.push(PipelineStep { task, settings });
    }

    pub fn with_step(mut self, task: Box<dyn Task>, settings: ValueCollection) -> Self {
        self.push(task, settings);
        self
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every task in test mode against a scratch copy of `systems`.
    ///
    /// Declared outputs are provisioned in the scratch registry as copies of the
    /// producing task's first input, so that later tasks consuming them resolve.
    /// `systems` itself is never modified.
    #[instrument(skip_all, name = "pipeline_validation")]
    pub fn validate(&self, systems: &SystemsMap) -> Result<(), TaskError> {
        let mut scratch = systems.clone();
        let no_observers = ObserverSet::new();

        for step in &self.steps {
            let task = step.task.as_ref();
            debug!(task = task.name(), "Validating task.");
            task.run(&mut scratch, step.settings.clone(), true, &no_observers)?;

            let template = scratch.clone_for_task(&task.input()[0], task.name())?;
            for output in task.output() {
                if !scratch.contains(output) {
                    scratch.commit(output.clone(), template.clone_box());
                }
            }
        }
        Ok(())
    }

    /// Validates and then executes the pipeline.
    ///
    /// Tasks run strictly in order, each seeing the registry exactly as the
    /// previous tasks left it. A task reporting `false` is recorded and the run
    /// continues; any error aborts the run immediately.
    ///
    /// A task that fails recoverably commits nothing, so a later task consuming
    /// its output aborts the run with [`TaskError::MissingSystem`]. The outcomes
    /// recorded up to that point are not returned.
    #[instrument(skip_all, name = "pipeline_run")]
    pub fn run(
        &self,
        systems: &mut SystemsMap,
        observers: &ObserverSet,
        reporter: &ProgressReporter,
    ) -> Result<PipelineReport, TaskError> {
        let mut state = RunState::NotStarted;
        let total = self.steps.len();
        debug!(?state, tasks = total, "Pipeline created.");

        state = RunState::ValidatingInputs;
        debug!(?state, "Pipeline state changed.");
        reporter.report(Progress::ValidationStart { total_tasks: total });
        if let Err(e) = self.validate(systems) {
            error!(state = ?RunState::FailedFatal, "Pipeline validation failed: {}", e);
            return Err(e);
        }
        reporter.report(Progress::ValidationFinish);

        state = RunState::Executing;
        debug!(?state, "Pipeline state changed.");
        let mut outcomes = Vec::with_capacity(total);

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.task.name().to_string();
            reporter.report(Progress::TaskStart {
                name: name.clone(),
                index,
                total,
            });
            info!(task = %name, index, "Running task.");

            let success = match step.task.run(systems, step.settings.clone(), false, observers) {
                Ok(success) => success,
                Err(e) if e.is_validation_error() => {
                    error!(
                        state = ?RunState::FailedFatal,
                        task = %name,
                        "Task could not start (did an earlier task fail without stopping?): {}",
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    error!(state = ?RunState::FailedFatal, task = %name, "Task failed: {}", e);
                    return Err(e);
                }
            };

            if !success {
                warn!(task = %name, "Task reported a failure; continuing with the next task.");
                reporter.report(Progress::Message(format!(
                    "{} failed; its outputs were not committed.",
                    name
                )));
            }
            reporter.report(Progress::TaskFinish {
                name: name.clone(),
                success,
            });
            outcomes.push(TaskOutcome {
                task: name,
                success,
            });
        }

        state = if outcomes.iter().all(|outcome| outcome.success) {
            RunState::Succeeded
        } else {
            RunState::FailedRecoverable
        };
        info!(?state, "Pipeline finished.");

        Ok(PipelineReport { state, outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log::Log;
    use crate::core::models::results::Results;
    use crate::core::models::structure::AtomCollection;
    use crate::engine::config::OptimizerConfigBuilder;
    use crate::engine::tasks::test_support::{
        ScriptedCalculator, harmonic_registry, names, water,
    };
    use crate::engine::tasks::{GeometryOptimizationTask, SinglePointTask};
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    fn single_point(input: &str, output: &str) -> Box<dyn Task> {
        Box::new(SinglePointTask::new(names(&[input]), names(&[output]), Some(Log::silent())).unwrap())
    }

    fn optimization(input: &str, output: &str) -> Box<dyn Task> {
        Box::new(
            GeometryOptimizationTask::new(names(&[input]), names(&[output]), Some(Log::silent()))
                .unwrap()
                .with_optimizer(
                    OptimizerConfigBuilder::new()
                        .max_iterations(2000)
                        .step_size(0.2)
                        .build()
                        .unwrap(),
                ),
        )
    }

    fn stop_on_error(value: bool) -> ValueCollection {
        [("stop_on_error", value)].into_iter().collect()
    }

    #[test]
    fn scenario_a_optimization_adds_output_and_keeps_input() {
        let mut systems = harmonic_registry("water");
        let pipeline = Pipeline::new().with_step(optimization("water", "water_opt"), ValueCollection::new());

        let report = pipeline
            .run(&mut systems, &ObserverSet::new(), &ProgressReporter::new())
            .unwrap();

        assert!(report.succeeded());
        assert!(systems.contains("water_opt"));
        assert_eq!(systems.lookup("water", "test").unwrap().structure(), &water());
        assert_ne!(systems.lookup("water_opt", "test").unwrap().structure(), &water());
    }

    #[test]
    fn scenario_b_recoverable_failure_lets_pipeline_continue() {
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(ScriptedCalculator::failing()));
        systems.commit("ammonia", Box::new(ScriptedCalculator::succeeding()));

        let pipeline = Pipeline::new()
            .with_step(optimization("water", "water_opt"), stop_on_error(false))
            .with_step(single_point("ammonia", "ammonia_sp"), ValueCollection::new());

        let report = pipeline
            .run(&mut systems, &ObserverSet::new(), &ProgressReporter::new())
            .unwrap();

        assert_eq!(report.state, RunState::FailedRecoverable);
        assert_eq!(report.outcomes.len(), 2);
        assert!(!report.outcomes[0].success);
        assert!(report.outcomes[1].success);
        assert!(!systems.contains("water_opt"));
        assert!(systems.contains("ammonia_sp"));
    }

    #[test]
    fn scenario_c_unrecognized_setting_fails_before_any_computation() {
        let calculator = ScriptedCalculator::succeeding();
        let computations = calculator.computations();
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(calculator));

        let settings: ValueCollection = [("foo", 1)].into_iter().collect();
        let pipeline = Pipeline::new()
            .with_step(single_point("water", "water_sp"), ValueCollection::new())
            .with_step(single_point("water_sp", "water_sp2"), settings);

        let error = pipeline
            .run(&mut systems, &ObserverSet::new(), &ProgressReporter::new())
            .unwrap_err();

        match error {
            TaskError::UnrecognizedSettings { ref task, ref keys } => {
                assert_eq!(task, SinglePointTask::NAME);
                assert_eq!(keys, &vec!["foo".to_string()]);
            }
            other => panic!("expected UnrecognizedSettings, got {:?}", other),
        }
        assert_eq!(computations.load(Ordering::SeqCst), 0);
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["water"]);
    }

    #[test]
    fn validation_resolves_outputs_of_earlier_tasks() {
        let systems = harmonic_registry("water");
        let pipeline = Pipeline::new()
            .with_step(optimization("water", "water_opt"), ValueCollection::new())
            .with_step(single_point("water_opt", "water_final"), ValueCollection::new());

        pipeline.validate(&systems).unwrap();
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["water"]);
    }

    #[test]
    fn validation_reports_inputs_nobody_produces() {
        let systems = harmonic_registry("water");
        let pipeline = Pipeline::new()
            .with_step(optimization("water", "water_opt"), ValueCollection::new())
            .with_step(single_point("ethanol", "ethanol_sp"), ValueCollection::new());

        let result = pipeline.validate(&systems);
        assert!(matches!(result, Err(TaskError::MissingSystem { ref name, .. }) if name == "ethanol"));
    }

    #[test]
    fn fatal_failure_aborts_remaining_tasks() {
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(ScriptedCalculator::failing()));
        let survivor = ScriptedCalculator::succeeding();
        let computations = survivor.computations();
        systems.commit("ammonia", Box::new(survivor));

        let pipeline = Pipeline::new()
            .with_step(single_point("water", "water_sp"), ValueCollection::new())
            .with_step(single_point("ammonia", "ammonia_sp"), ValueCollection::new());

        let result = pipeline.run(&mut systems, &ObserverSet::new(), &ProgressReporter::new());

        assert!(matches!(result, Err(TaskError::Calculation { .. })));
        assert_eq!(computations.load(Ordering::SeqCst), 0);
        assert!(!systems.contains("ammonia_sp"));
    }

    #[test]
    fn consuming_the_output_of_a_recoverable_failure_aborts_the_run() {
        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(ScriptedCalculator::failing()));
        let pipeline = Pipeline::new()
            .with_step(single_point("water", "water_sp"), stop_on_error(false))
            .with_step(single_point("water_sp", "water_final"), ValueCollection::new());

        let error = pipeline
            .run(&mut systems, &ObserverSet::new(), &ProgressReporter::new())
            .unwrap_err();

        assert!(error.is_validation_error());
        assert!(matches!(error, TaskError::MissingSystem { ref name, .. } if name == "water_sp"));
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["water"]);
    }

    #[test]
    fn recoverable_failure_is_reported_as_a_progress_message() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        let mut systems = SystemsMap::new();
        systems.commit("water", Box::new(ScriptedCalculator::failing()));
        let pipeline = Pipeline::new().with_step(single_point("water", "water_sp"), stop_on_error(false));
        pipeline.run(&mut systems, &ObserverSet::new(), &reporter).unwrap();

        let events = events.lock().unwrap();
        let messages: Vec<&String> = events
            .iter()
            .filter_map(|event| match event {
                Progress::Message(message) => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains(SinglePointTask::NAME));
        assert!(matches!(
            events.last(),
            Some(Progress::TaskFinish { success: false, .. })
        ));
    }

    #[test]
    fn later_tasks_see_committed_outputs() {
        let mut systems = harmonic_registry("water");
        let pipeline = Pipeline::new()
            .with_step(optimization("water", "water_opt"), ValueCollection::new())
            .with_step(single_point("water_opt", "water_final"), ValueCollection::new());

        pipeline
            .run(&mut systems, &ObserverSet::new(), &ProgressReporter::new())
            .unwrap();

        assert_eq!(
            systems.lookup("water_final", "test").unwrap().structure(),
            systems.lookup("water_opt", "test").unwrap().structure()
        );
    }

    #[test]
    fn progress_events_follow_task_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        let mut systems = harmonic_registry("water");
        let pipeline = Pipeline::new()
            .with_step(single_point("water", "a"), ValueCollection::new())
            .with_step(single_point("a", "b"), ValueCollection::new());
        pipeline.run(&mut systems, &ObserverSet::new(), &reporter).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                Progress::ValidationStart { total_tasks: 2 },
                Progress::ValidationFinish,
                Progress::TaskStart {
                    name: SinglePointTask::NAME.to_string(),
                    index: 0,
                    total: 2
                },
                Progress::TaskFinish {
                    name: SinglePointTask::NAME.to_string(),
                    success: true
                },
                Progress::TaskStart {
                    name: SinglePointTask::NAME.to_string(),
                    index: 1,
                    total: 2
                },
                Progress::TaskFinish {
                    name: SinglePointTask::NAME.to_string(),
                    success: true
                },
            ]
        );
    }

    #[test]
    fn observers_are_forwarded_to_tasks() {
        let labels = Mutex::new(Vec::new());
        let observers = ObserverSet::new().with(Box::new(
            |_: usize, _: &AtomCollection, _: &Results, label: &str| {
                labels.lock().unwrap().push(label.to_string());
            },
        ));

        let mut systems = harmonic_registry("water");
        let pipeline = Pipeline::new().with_step(optimization("water", "water_opt"), ValueCollection::new());
        pipeline
            .run(&mut systems, &observers, &ProgressReporter::new())
            .unwrap();
        drop(observers);

        let labels = labels.into_inner().unwrap();
        assert!(!labels.is_empty());
        assert!(labels.iter().all(|label| label == "geometry_optimization"));
    }
}
