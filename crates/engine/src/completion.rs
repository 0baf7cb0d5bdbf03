//! The completion handler's retry-policy decision (spec §4.2 main loop,
//! step 3).

use flowctl_core::{JobInfo, Node};
use std::path::Path;

/// What the completion handler should do with a just-finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// All declared outputs are present; transition to Complete.
    Success,
    /// Transition back to Waiting and re-dispatch.
    Retry,
    /// Permanently Failed; sets the workflow-failed flag.
    Fail,
}

/// Returns the name of the first declared target that is not readable on
/// disk, or `None` if every target is present.
pub fn missing_output(node: &Node, work_dir: &Path) -> Option<String> {
    node.targets
        .iter()
        .map(|t| t.outer.to_string())
        .find(|name| !work_dir.join(name).is_file())
}

/// Decides the retry/fail/success outcome of one completed job.
///
/// A job that exited normally with code 0 is still demoted to a failure
/// if a declared output went missing (spec: "a missing output converts a
/// 'success' into a failure"). From there, and for any non-zero/signalled
/// exit, the node retries if retries are enabled and its failure count is
/// still under the configured maximum, or unconditionally if the exit
/// code is the reserved transient-retry code, and otherwise fails for
/// good.
pub fn decide(
    info: &JobInfo,
    missing_output: Option<&str>,
    failure_count: u32,
    retry_enabled: bool,
    retry_max: u32,
) -> CompletionOutcome {
    let succeeded = info.exited_normally && info.exit_code == Some(0) && missing_output.is_none();
    if succeeded {
        return CompletionOutcome::Success;
    }

    if info.is_transient_retry() {
        return CompletionOutcome::Retry;
    }

    if retry_enabled && failure_count < retry_max {
        return CompletionOutcome::Retry;
    }

    CompletionOutcome::Fail
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
