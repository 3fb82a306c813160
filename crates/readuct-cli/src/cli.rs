use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ReaDuct CLI - Run pipelines of chemistry tasks over named systems.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the task pipeline described by a TOML file.
    Run(RunArgs),
    /// List the task types and calculator method families known to this build.
    List,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the pipeline file in TOML format.
    #[arg(value_name = "PATH")]
    pub config: PathBuf,

    /// Only validate the pipeline (inputs, settings) without running any calculation.
    #[arg(short, long)]
    pub test: bool,

    /// Directory to write the final structure of every system to, as XYZ files.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Directory to record optimization trajectories in, one XYZ file per algorithm.
    #[arg(long, value_name = "DIR")]
    pub trajectory: Option<PathBuf>,

    /// Only warn about unrecognized task settings instead of failing.
    #[arg(long)]
    pub lenient: bool,
}
