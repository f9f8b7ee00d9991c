//! Consistency checks for parsed traces.
//!
//! A trace produced by [`crate::TraceParser`] should always pass; the checks
//! exist for the `validate` command and as a safety net in tests when the
//! parser or a collaborator changes.
//!
//! # Entry Points
//!
//! - [`validate_trace`] - Check a trace with the default configuration
//! - [`run_trace_validations`] - Check a trace with a custom configuration

mod config;
mod result;
mod runner;

pub use config::ValidationConfig;
pub use result::{ValidationError, ValidationResult, ValidationWarning};
pub use runner::run_trace_validations;

use crate::trace::Trace;

/// Validate `trace` with the default configuration.
pub fn validate_trace(trace: &Trace) -> ValidationResult {
    let mut result = ValidationResult::default();
    run_trace_validations(trace, &ValidationConfig::default(), &mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FunctionId;
    use crate::protos::gltrace::Function;
    use crate::trace::{Call, Frame, TraceFileInfo};
    use std::path::PathBuf;

    fn call(index: usize, function: Function, context_id: i32, start_time: i64) -> Call {
        Call {
            index,
            start_time,
            trace_offset: 0,
            function: FunctionId::from(function),
            duration: 0,
            context_id,
            has_framebuffer: false,
            display_text: String::new(),
            thumbnail: None,
        }
    }

    fn make_trace(calls: Vec<Call>, frames: Vec<(usize, usize)>, context_ids: Vec<i32>) -> Trace {
        let state_deltas = vec![Vec::new(); calls.len()];
        Trace {
            info: TraceFileInfo {
                path: PathBuf::from("/tmp/validate.gltrace"),
                size: 0,
                modified: None,
            },
            frames: frames
                .into_iter()
                .enumerate()
                .map(|(index, (first_call, last_call))| Frame {
                    index,
                    first_call,
                    last_call,
                })
                .collect(),
            calls,
            context_ids,
            state_deltas,
        }
    }

    #[test]
    fn test_consistent_trace_is_valid() {
        let trace = make_trace(
            vec![
                call(0, Function::glClear, 0, 0),
                call(1, Function::eglSwapBuffers, 1, 10),
            ],
            vec![(0, 1)],
            vec![0, 1],
        );
        let result = validate_trace(&trace);
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_empty_trace_warns() {
        let result = validate_trace(&make_trace(Vec::new(), Vec::new(), Vec::new()));
        assert!(result.is_valid());
        assert_eq!(result.warnings, vec![ValidationWarning::EmptyTrace]);
    }

    #[test]
    fn test_detects_gap_and_coverage() {
        let trace = make_trace(
            vec![
                call(0, Function::eglSwapBuffers, 0, 0),
                call(1, Function::glClear, 0, 1),
                call(2, Function::eglSwapBuffers, 0, 2),
            ],
            vec![(0, 0), (2, 2)],
            vec![0],
        );
        let result = validate_trace(&trace);
        assert_eq!(
            result.errors,
            vec![ValidationError::FrameGap {
                frame: 1,
                expected_first: 1,
                first: 2,
            }]
        );

        let trace = make_trace(
            vec![
                call(0, Function::glClear, 0, 0),
                call(1, Function::glClear, 0, 1),
            ],
            vec![(0, 0)],
            vec![0],
        );
        let result = validate_trace(&trace);
        assert_eq!(
            result.errors,
            vec![ValidationError::FrameCoverage {
                covered: 1,
                calls: 2
            }]
        );
    }

    #[test]
    fn test_detects_order_and_normalization() {
        let trace = make_trace(
            vec![
                call(0, Function::glClear, 0, 20),
                call(1, Function::eglSwapBuffers, 1, 5),
            ],
            vec![(0, 1)],
            vec![0, 1],
        );
        let result = validate_trace(&trace);
        assert_eq!(
            result.errors,
            vec![
                ValidationError::NotNormalized { min_start_time: 5 },
                ValidationError::OutOfOrder {
                    index: 1,
                    start_time: 5,
                    previous: 20,
                },
            ]
        );
    }

    #[test]
    fn test_single_context_order_not_checked() {
        let trace = make_trace(
            vec![
                call(0, Function::glClear, 0, 20),
                call(1, Function::eglSwapBuffers, 0, 0),
            ],
            vec![(0, 1)],
            vec![0],
        );
        assert!(validate_trace(&trace).is_valid());
    }

    #[test]
    fn test_error_cap_per_check() {
        let calls: Vec<Call> = (0..20)
            .map(|i| call(i + 1, Function::glClear, 0, i as i64))
            .collect();
        let trace = make_trace(calls, vec![(0, 19)], vec![0]);

        let mut result = ValidationResult::default();
        let config = ValidationConfig {
            max_errors_per_category: 3,
            ..Default::default()
        };
        run_trace_validations(&trace, &config, &mut result);
        assert_eq!(result.errors.len(), 3);
        assert!(result.warnings.contains(&ValidationWarning::TooManyErrors {
            check: "call_index".to_string(),
            shown: 3,
        }));
    }

    #[test]
    fn test_trailing_frame_warning() {
        let trace = make_trace(
            vec![
                call(0, Function::eglSwapBuffers, 0, 0),
                call(1, Function::glClear, 0, 1),
            ],
            vec![(0, 0), (1, 1)],
            vec![0],
        );
        let result = validate_trace(&trace);
        assert!(result.is_valid());
        assert_eq!(
            result.warnings,
            vec![ValidationWarning::TrailingFrame { frame: 1, calls: 1 }]
        );
    }

    #[test]
    fn test_unlisted_context_id() {
        let trace = make_trace(
            vec![call(0, Function::eglSwapBuffers, 3, 0)],
            vec![(0, 0)],
            vec![0],
        );
        let result = validate_trace(&trace);
        assert!(matches!(
            result.errors.as_slice(),
            [ValidationError::ContextIds { .. }]
        ));
    }
}
