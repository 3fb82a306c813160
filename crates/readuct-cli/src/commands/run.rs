use crate::cli::RunArgs;
use crate::config::PipelineFile;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use crate::utils::trajectory::TrajectoryRecorder;
use readuct::core::calculators::CalculatorFactory;
use readuct::core::io::traits::StructureFile;
use readuct::core::io::xyz::XyzFile;
use readuct::engine::observer::ObserverSet;
use readuct::engine::progress::ProgressReporter;
use readuct::engine::registry::SystemsMap;
use readuct::engine::settings::UnrecognizedSettingsPolicy;
use readuct::workflows::pipeline::PipelineReport;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let policy = if args.lenient {
        UnrecognizedSettingsPolicy::Warn
    } else {
        UnrecognizedSettingsPolicy::Reject
    };

    info!("Loading pipeline from {:?}", &args.config);
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));
    let loaded = PipelineFile::from_file(&args.config)?.assemble(
        base_dir,
        &CalculatorFactory::default(),
        policy,
    )?;
    let mut systems = loaded.systems;
    let pipeline = loaded.pipeline;
    info!(
        "Loaded {} system(s) and {} task(s).",
        systems.len(),
        pipeline.len()
    );

    if args.test {
        pipeline.validate(&systems)?;
        println!("✓ Pipeline is valid ({} task(s)).", pipeline.len());
        return Ok(());
    }

    let recorder = args
        .trajectory
        .as_deref()
        .map(TrajectoryRecorder::new)
        .transpose()?;
    let mut observers = ObserverSet::new();
    if let Some(recorder) = &recorder {
        observers.add(recorder.observer());
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Running {} task(s)...", pipeline.len());
    let report = pipeline.run(&mut systems, &observers, &reporter)?;
    drop(observers);

    if let Some(recorder) = recorder {
        for path in recorder.finish()? {
            println!("  Trajectory written to: {}", path.display());
        }
    }

    print_summary(&report);

    if let Some(dir) = &args.output {
        write_systems(&systems, dir)?;
    }

    Ok(())
}

fn print_summary(report: &PipelineReport) {
    for outcome in &report.outcomes {
        let mark = if outcome.success { "✓" } else { "✗" };
        println!("{} {}", mark, outcome.task);
    }

    if report.succeeded() {
        println!("All tasks completed successfully.");
    } else {
        let failed = report.failed_tasks().count();
        warn!("{} task(s) reported a failure.", failed);
        println!(
            "Warning: {} of {} task(s) reported a failure.",
            failed,
            report.outcomes.len()
        );
    }
}

fn write_systems(systems: &SystemsMap, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (name, calculator) in systems.iter() {
        let path = dir.join(format!("{}.xyz", name));
        info!("Writing system '{}' to {:?}", name, &path);
        let comment = format!("{} ({})", name, calculator.method_family());
        XyzFile::write_to_path(calculator.structure(), &comment, &path).map_err(|e| {
            CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            }
        })?;
    }
    println!("Final structures written to: {}", dir.display());
    Ok(())
}
