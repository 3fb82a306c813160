//! The task-settings extraction protocol.
//!
//! Every task pulls its options out of the task-settings collection with the
//! functions in this module. Extraction consumes keys, so once a task has
//! extracted everything it understands, [`check_residual_settings`] can reject
//! whatever is left instead of silently ignoring a misspelled option.

use super::error::TaskError;
use crate::core::log::Log;
use crate::core::settings::{SettingsError, ValueCollection};

pub const STOP_ON_ERROR: &str = "stop_on_error";
pub const SILENT_STDOUT_CALCULATOR: &str = "silent_stdout_calculator";
/// Deprecated alias superseded by [`STOP_ON_ERROR`], with inverted meaning.
pub const ALLOW_UNCONVERGED: &str = "allow_unconverged";

/// What a task does with task-settings keys nobody extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnrecognizedSettingsPolicy {
    /// Fail the run with [`TaskError::UnrecognizedSettings`].
    #[default]
    Reject,
    /// Report the keys on the warning stream and carry on.
    Warn,
}

/// Extracts the stop-on-error flag, honoring the deprecated `allow_unconverged`.
///
/// If `allow_unconverged` is present, a deprecation warning is written once and
/// its negation becomes the default for `stop_on_error`. An explicit
/// `stop_on_error` always wins. Without either key the flag is `true`.
pub fn extract_stop_on_error(settings: &mut ValueCollection, log: &Log) -> Result<bool, SettingsError> {
    let mut stop_on_error = true;
    if settings.value_exists(ALLOW_UNCONVERGED) {
        log.warning.write(
            "  The option 'allow_unconverged' is deprecated.\n  It has been replaced with 'stop_on_error',\n  which is now available for all tasks and is defaulted to 'true'.\n",
        );
        stop_on_error = !settings.extract(ALLOW_UNCONVERGED, false)?;
    }
    settings.extract(STOP_ON_ERROR, stop_on_error)
}

/// Extracts whether the calculator's own output should be suppressed.
pub fn extract_silent_calculator(settings: &mut ValueCollection) -> Result<bool, SettingsError> {
    settings.extract(SILENT_STDOUT_CALCULATOR, true)
}

/// The fixed diagnostic for task settings a task did not recognize.
pub fn unrecognized_settings_message(task: &str) -> String {
    format!(
        "  You gave Task settings for the {},\n  \
         but the only possible settings for this task are the\n  \
         '{}' option to control whether ReaDuct fails\n  \
         with a failed calculation or simply returns false\n  \
         and the '{}' option to control whether\n  \
         the standard output of the calculator should be printed.\n  \
         You might want to specify the settings you put into the task settings\n  \
         in the systems section.",
        task, STOP_ON_ERROR, SILENT_STDOUT_CALCULATOR
    )
}

/// Applies `policy` to whatever keys remain in `settings`.
pub fn check_residual_settings(
    task: &str,
    settings: &ValueCollection,
    policy: UnrecognizedSettingsPolicy,
    log: &Log,
) -> Result<(), TaskError> {
    if settings.is_empty() {
        return Ok(());
    }
    let keys: Vec<String> = settings.keys().map(str::to_string).collect();
    match policy {
        UnrecognizedSettingsPolicy::Reject => Err(TaskError::UnrecognizedSettings {
            task: task.to_string(),
            keys,
        }),
        UnrecognizedSettingsPolicy::Warn => {
            log.warning.write(format!(
                "  Ignoring unrecognized task settings {:?}.\n{}",
                keys,
                unrecognized_settings_message(task)
            ));
            Ok(())
        }
    }
}
