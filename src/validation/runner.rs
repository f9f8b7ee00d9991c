//! Trace invariant checks.
//!
//! Each check collects its errors separately so that one broken invariant
//! cannot flood the report; only the first `max_errors_per_category` errors of
//! a check are kept.

use super::config::ValidationConfig;
use super::result::{ValidationError, ValidationResult, ValidationWarning};
use crate::trace::Trace;

/// Run every check against `trace`.
pub fn run_trace_validations(
    trace: &Trace,
    config: &ValidationConfig,
    result: &mut ValidationResult,
) {
    report(result, config, "call_index", validate_call_indices(trace));
    report(result, config, "start_time", validate_start_times(trace));
    report(result, config, "frames", validate_frames(trace));
    report(result, config, "state_deltas", validate_state_deltas(trace));
    report(result, config, "context_ids", validate_context_ids(trace));
    add_warnings(trace, config, result);
}

fn report(
    result: &mut ValidationResult,
    config: &ValidationConfig,
    check: &str,
    errors: Vec<ValidationError>,
) {
    let total = errors.len();
    for error in errors.into_iter().take(config.max_errors_per_category) {
        result.add_error(error);
    }
    if total > config.max_errors_per_category {
        result.add_warning(ValidationWarning::TooManyErrors {
            check: check.to_string(),
            shown: config.max_errors_per_category,
        });
    }
}

fn validate_call_indices(trace: &Trace) -> Vec<ValidationError> {
    trace
        .calls()
        .iter()
        .enumerate()
        .filter(|(position, call)| call.index() != *position)
        .map(|(position, call)| ValidationError::IndexMismatch {
            position,
            index: call.index(),
        })
        .collect()
}

fn validate_start_times(trace: &Trace) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let calls = trace.calls();

    if let Some(min_start_time) = calls.iter().map(|c| c.start_time()).min() {
        if min_start_time != 0 {
            errors.push(ValidationError::NotNormalized { min_start_time });
        }
    }

    // Only traces with more than the default context are reordered.
    let multi_context = trace.context_ids().last().is_some_and(|&id| id > 0);
    if multi_context {
        for pair in calls.windows(2) {
            if pair[1].start_time() < pair[0].start_time() {
                errors.push(ValidationError::OutOfOrder {
                    index: pair[1].index(),
                    start_time: pair[1].start_time(),
                    previous: pair[0].start_time(),
                });
            }
        }
    }

    errors
}

fn validate_frames(trace: &Trace) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let num_calls = trace.calls().len();
    let mut expected_first = 0;

    for (position, frame) in trace.frames().iter().enumerate() {
        if frame.index() != position
            || frame.first_call() > frame.last_call()
            || frame.last_call() >= num_calls
        {
            errors.push(ValidationError::InvalidFrame {
                frame: position,
                first: frame.first_call(),
                last: frame.last_call(),
            });
        }
        if frame.first_call() != expected_first {
            errors.push(ValidationError::FrameGap {
                frame: position,
                expected_first,
                first: frame.first_call(),
            });
        }
        expected_first = frame.last_call() + 1;
    }

    if expected_first != num_calls {
        errors.push(ValidationError::FrameCoverage {
            covered: expected_first,
            calls: num_calls,
        });
    }

    errors
}

fn validate_state_deltas(trace: &Trace) -> Vec<ValidationError> {
    let calls = trace.calls().len();
    let deltas = trace.state_deltas.len();
    if calls == deltas {
        Vec::new()
    } else {
        vec![ValidationError::StateDeltaMismatch { calls, deltas }]
    }
}

fn validate_context_ids(trace: &Trace) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let ids = trace.context_ids();

    if ids.windows(2).any(|pair| pair[0] >= pair[1]) {
        errors.push(ValidationError::ContextIds {
            message: format!("{ids:?} is not strictly ascending"),
        });
    }

    for call in trace.calls() {
        if !ids.contains(&call.context_id()) {
            errors.push(ValidationError::ContextIds {
                message: format!(
                    "call {} uses context {} which is not listed",
                    call.index(),
                    call.context_id()
                ),
            });
        }
    }

    errors
}

fn add_warnings(trace: &Trace, config: &ValidationConfig, result: &mut ValidationResult) {
    let calls = trace.calls();
    if calls.is_empty() {
        result.add_warning(ValidationWarning::EmptyTrace);
        return;
    }

    if !calls.iter().any(|c| c.function().is_present()) {
        result.add_warning(ValidationWarning::NoPresentCalls { calls: calls.len() });
        return;
    }

    if config.warn_on_trailing_frame {
        if let Some(frame) = trace.frames().last() {
            let terminated = trace
                .call(frame.last_call())
                .is_some_and(|c| c.function().is_present());
            if !terminated {
                result.add_warning(ValidationWarning::TrailingFrame {
                    frame: frame.index(),
                    calls: frame.len(),
                });
            }
        }
    }
}
