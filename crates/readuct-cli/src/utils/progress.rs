use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use readuct::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const VALIDATION_TICK: Duration = Duration::from_millis(100);

/// Renders pipeline progress events as a spinner during validation and a
/// per-task bar during execution.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.finish_and_clear();
        Self {
            bar: Arc::new(Mutex::new(bar)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let bar = Arc::clone(&self.bar);
        Box::new(move |event: Progress| match bar.lock() {
            Ok(guard) => apply(&guard, event),
            Err(_) => warn!("Progress display lock was poisoned; dropping event."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(bar: &ProgressBar, event: Progress) {
    match event {
        Progress::ValidationStart { total_tasks } => {
            bar.reset();
            bar.set_style(validation_style());
            bar.set_message(format!("Validating {} task(s)", total_tasks));
            bar.enable_steady_tick(VALIDATION_TICK);
        }
        Progress::ValidationFinish => {
            bar.disable_steady_tick();
            bar.finish_with_message("✓ Pipeline is valid");
        }
        Progress::TaskStart { name, index, total } => {
            if bar.is_finished() {
                bar.reset();
                bar.set_style(execution_style());
            }
            bar.set_length(total as u64);
            bar.set_position(index as u64);
            bar.set_message(name);
        }
        Progress::TaskFinish { .. } => {
            bar.inc(1);
            if Some(bar.position()) >= bar.length() {
                bar.finish_with_message("✓ All tasks processed");
            }
        }
        Progress::Message(message) => bar.println(format!("  ✗ {}", message)),
    }
}

fn validation_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.yellow} {msg}")
        .expect("Failed to create validation style template")
}

fn execution_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix}[{bar:32.green/white}] {pos}/{len} {wide_msg}")
        .expect("Failed to create execution style template")
        .progress_chars("=> ")
}
