use crate::orchestrator::backoff::Cancelled;
use crate::orchestrator::readiness::ReadinessError;
use anyhow::Error as AnyError;
use std::process::ExitCode;

/// Exit code for every failed run. CI only distinguishes success from failure.
pub const FAILURE_EXIT_CODE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ProcessGone,
    NotResponding,
    Cancelled,
    Other,
}

pub fn classify(error: &AnyError) -> FailureKind {
    for cause in error.chain() {
        if let Some(readiness) = cause.downcast_ref::<ReadinessError>() {
            return match readiness {
                ReadinessError::ProcessGone { .. } => FailureKind::ProcessGone,
                ReadinessError::NotResponding { .. } => FailureKind::NotResponding,
                ReadinessError::Cancelled => FailureKind::Cancelled,
                ReadinessError::Query(_) | ReadinessError::Process(_) => FailureKind::Other,
            };
        }
        if cause.downcast_ref::<Cancelled>().is_some() {
            return FailureKind::Cancelled;
        }
    }
    FailureKind::Other
}

/// Console line printed on stdout for CI logs.
///
/// Readiness verdicts keep their fixed wording so existing log greps keep working;
/// anything else prints the full context chain.
pub fn failure_message(error: &AnyError) -> String {
    match classify(error) {
        FailureKind::ProcessGone | FailureKind::NotResponding => error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ReadinessError>())
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("{error:#}")),
        FailureKind::Cancelled | FailureKind::Other => format!("{error:#}"),
    }
}

/// Logs the failure, prints its console message, and returns the process exit code.
pub fn report_failure(error: &AnyError) -> ExitCode {
    let kind = classify(error);
    tracing::error!(kind = ?kind, error = %format!("{error:#}"), "validator orchestration failed");
    println!("{}", failure_message(error));
    ExitCode::from(FAILURE_EXIT_CODE)
}
