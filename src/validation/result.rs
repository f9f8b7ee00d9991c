//! Validation result types.
//!
//! This module defines the core types for validation results:
//! - `ValidationResult` - container for errors and warnings
//! - `ValidationError` - broken trace invariants
//! - `ValidationWarning` - legal but suspicious traces

use std::fmt;

/// Result of validating a trace.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors that indicate an inconsistent trace model.
    pub errors: Vec<ValidationError>,
    /// Warnings that indicate potential issues with the capture.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Returns true if there are any validation errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if there are any validation warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns true if the trace is valid (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A call's stored index differs from its position.
    IndexMismatch { position: usize, index: usize },
    /// The earliest call does not start at time 0.
    NotNormalized { min_start_time: i64 },
    /// Calls from several contexts are not in start time order.
    OutOfOrder {
        index: usize,
        start_time: i64,
        previous: i64,
    },
    /// A frame does not begin right after the previous one.
    FrameGap {
        frame: usize,
        expected_first: usize,
        first: usize,
    },
    /// A frame's range is inverted or its stored index is wrong.
    InvalidFrame {
        frame: usize,
        first: usize,
        last: usize,
    },
    /// The frames do not end at the last call.
    FrameCoverage { covered: usize, calls: usize },
    /// State delta lists are not aligned with calls.
    StateDeltaMismatch { calls: usize, deltas: usize },
    /// The context id set is unsorted, has duplicates, or misses a call's id.
    ContextIds { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::IndexMismatch { position, index } => {
                write!(f, "call at position {position} has index {index}")
            }
            ValidationError::NotNormalized { min_start_time } => {
                write!(f, "earliest call starts at {min_start_time}, expected 0")
            }
            ValidationError::OutOfOrder {
                index,
                start_time,
                previous,
            } => {
                write!(
                    f,
                    "call {index} starts at {start_time}, before previous call at {previous}"
                )
            }
            ValidationError::FrameGap {
                frame,
                expected_first,
                first,
            } => {
                write!(
                    f,
                    "frame {frame} starts at call {first}, expected {expected_first}"
                )
            }
            ValidationError::InvalidFrame { frame, first, last } => {
                write!(f, "frame {frame} has invalid range {first}..={last}")
            }
            ValidationError::FrameCoverage { covered, calls } => {
                write!(f, "frames cover {covered} of {calls} calls")
            }
            ValidationError::StateDeltaMismatch { calls, deltas } => {
                write!(f, "{deltas} state delta lists for {calls} calls")
            }
            ValidationError::ContextIds { message } => {
                write!(f, "context ids: {message}")
            }
        }
    }
}

/// Validation warning types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The trace has no calls.
    EmptyTrace,
    /// Calls exist but none of them presents a frame.
    NoPresentCalls { calls: usize },
    /// The last frame ends without a present call.
    TrailingFrame { frame: usize, calls: usize },
    /// Too many errors of the same type - only showing first N.
    TooManyErrors { check: String, shown: usize },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::EmptyTrace => write!(f, "trace has no calls"),
            ValidationWarning::NoPresentCalls { calls } => {
                write!(f, "none of the {calls} calls presents a frame")
            }
            ValidationWarning::TrailingFrame { frame, calls } => {
                write!(
                    f,
                    "frame {frame} ({calls} calls) is not terminated by a present call"
                )
            }
            ValidationWarning::TooManyErrors { check, shown } => {
                write!(f, "{check}: showing first {shown} errors, more exist")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_gap_display() {
        let error = ValidationError::FrameGap {
            frame: 2,
            expected_first: 10,
            first: 12,
        };
        assert_eq!(
            format!("{error}"),
            "frame 2 starts at call 12, expected 10"
        );
    }

    #[test]
    fn test_out_of_order_display() {
        let error = ValidationError::OutOfOrder {
            index: 4,
            start_time: 100,
            previous: 250,
        };
        assert_eq!(
            format!("{error}"),
            "call 4 starts at 100, before previous call at 250"
        );
    }

    #[test]
    fn test_trailing_frame_warning_display() {
        let warning = ValidationWarning::TrailingFrame { frame: 3, calls: 7 };
        assert_eq!(
            format!("{warning}"),
            "frame 3 (7 calls) is not terminated by a present call"
        );
    }

    #[test]
    fn test_validation_result_methods() {
        let mut result = ValidationResult::default();
        assert!(result.is_valid());
        assert!(!result.has_errors());
        assert!(!result.has_warnings());

        result.add_warning(ValidationWarning::EmptyTrace);
        assert!(result.is_valid());
        assert!(result.has_warnings());

        result.add_error(ValidationError::NotNormalized { min_start_time: 5 });
        assert!(!result.is_valid());
        assert!(result.has_errors());
    }
}
